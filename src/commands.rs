use std::path::PathBuf;
use std::sync::Arc;

use crate::bootstrap::{BootstrapFailure, ReadinessCheck};
use crate::config::LauncherConfig;
use crate::error::LauncherError;
use crate::events::{EventSink, UiEvent};
use crate::flags;
use crate::launcher::LaunchSupervisor;
use crate::models::{CatalogEntry, MIN_RAM_MB, ModLoader, Profile, ProfileMap};
use crate::profiles::{self, ProfileStore};
use crate::versions::merge_catalog;

/// Shared state handed to every command.
pub struct AppState {
    pub config: LauncherConfig,
    pub store: ProfileStore,
    pub events: Arc<dyn EventSink>,
}

impl AppState {
    pub fn new(config: LauncherConfig, events: Arc<dyn EventSink>) -> Self {
        Self {
            store: ProfileStore::from_config(&config),
            config,
            events,
        }
    }

    fn profile(&self, name: &str) -> Result<Profile, String> {
        self.store
            .load_checked()
            .map_err(|e| e.to_string())?
            .remove(name)
            .ok_or_else(|| LauncherError::ProfileNotFound(name.to_string()).to_string())
    }
}

pub async fn list_profiles(state: &AppState) -> Result<ProfileMap, String> {
    Ok(state.store.load())
}

pub async fn save_profile(state: &AppState, name: String, mut profile: Profile) -> Result<(), String> {
    let name = name.trim().to_string();
    profile.username = profile.username.trim().to_string();
    validate_profile(&name, &profile).map_err(|e| e.to_string())?;

    state
        .store
        .save(&name, &profile)
        .map_err(|e| format!("Failed to save profile: {}", e))?;
    state.events.emit(UiEvent::ProfileSaved { name });
    Ok(())
}

fn validate_profile(name: &str, profile: &Profile) -> Result<(), LauncherError> {
    if name.is_empty() {
        return Err(LauncherError::InvalidProfile("profile name is empty".to_string()));
    }
    if profile.username.trim().is_empty() {
        return Err(LauncherError::InvalidProfile("username is empty".to_string()));
    }
    if profile.version.trim().is_empty() {
        return Err(LauncherError::InvalidProfile("no version selected".to_string()));
    }
    if profile.ram < MIN_RAM_MB {
        return Err(LauncherError::InvalidProfile(format!(
            "at least {} MB of RAM are required, got {}",
            MIN_RAM_MB, profile.ram
        )));
    }
    Ok(())
}

/// Deletes a profile, and its instance directory when `purge` is set.
/// Returns whether the profile existed.
pub async fn delete_profile(state: &AppState, name: String, purge: bool) -> Result<bool, String> {
    if purge {
        if let Some(profile) = state.store.get(&name) {
            let dir = profiles::instance_dir_for(&state.config.instances_dir, &profile);
            profiles::remove_instance_dir(&state.config.instances_dir, &dir)
                .map_err(|e| format!("Failed to remove instance directory: {}", e))?;
        }
    }

    let existed = state
        .store
        .delete(&name)
        .map_err(|e| format!("Failed to delete profile: {}", e))?;
    if existed {
        state.events.emit(UiEvent::ProfileDeleted { name });
    }
    Ok(existed)
}

pub async fn load_versions(state: &AppState) -> Result<Vec<CatalogEntry>, String> {
    Ok(merge_catalog(&state.config.version_sources()))
}

pub async fn refresh_and_load_versions<D: ReadinessCheck>(
    state: &AppState,
    supervisor: &LaunchSupervisor<D>,
) -> Result<Vec<CatalogEntry>, String> {
    if let Err(e) = supervisor.refresh_versions().await {
        log::error!("Version refresh failed: {}", e);
        let reason = e.to_string();
        state.events.emit(UiEvent::VersionsFailed {
            reason: reason.clone(),
        });
        return Err(reason);
    }

    let catalog = load_versions(state).await?;
    state.events.emit(UiEvent::VersionsReady {
        count: catalog.len(),
    });
    Ok(catalog)
}

pub fn recommended_flags(version: &str, modloader: ModLoader) -> Vec<String> {
    flags::recommend(version, modloader)
}

pub async fn launch_profile<D: ReadinessCheck>(
    state: &AppState,
    supervisor: &LaunchSupervisor<D>,
    name: &str,
) -> Result<(), String> {
    let profile = state.profile(name)?;
    match supervisor.launch(&profile).await {
        Ok(()) => Ok(()),
        Err(LauncherError::DependencyNotReady(failure)) => {
            let message = format!("Cannot launch '{}': {}", name, failure.remediation);
            emit_dependency_failure(state, failure);
            Err(message)
        }
        Err(e) => Err(format!("Failed to launch '{}': {}", name, e)),
    }
}

pub async fn open_profile_dir(state: &AppState, name: &str) -> Result<PathBuf, String> {
    let profile = state.profile(name)?;
    let dir = profiles::instance_dir_for(&state.config.instances_dir, &profile);
    std::fs::create_dir_all(&dir).map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
    crate::utils::open_path(&dir)?;
    Ok(dir)
}

pub async fn check_dependencies<D: ReadinessCheck>(state: &AppState, readiness: &D) -> Result<(), String> {
    match readiness.check().await {
        Ok(()) => Ok(()),
        Err(failure) => {
            let message = format!("{} failed: {}", failure.step, failure.remediation);
            emit_dependency_failure(state, failure);
            Err(message)
        }
    }
}

fn emit_dependency_failure(state: &AppState, failure: BootstrapFailure) {
    state.events.emit(UiEvent::DependencyCheckFailed {
        step: failure.step,
        remediation: failure.remediation,
    });
}
