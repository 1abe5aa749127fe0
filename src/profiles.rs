use std::fs;
use std::path::{Path, PathBuf};

use crate::config::LauncherConfig;
use crate::error::{LauncherError, Result};
use crate::models::{MIN_RAM_MB, Profile, ProfileMap};

/// JSON-backed mapping of profile name to profile.
///
/// Every mutation rewrites the whole file. There is no protection against
/// concurrent writers: the last one wins.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &LauncherConfig) -> Self {
        Self::new(&config.profiles_file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads every profile. A missing or unreadable file yields an empty map;
    /// use [`ProfileStore::load_checked`] to tell the two apart.
    pub fn load(&self) -> ProfileMap {
        match self.load_checked() {
            Ok(profiles) => profiles,
            Err(e) => {
                log::warn!("{}; continuing with no profiles", e);
                ProfileMap::new()
            }
        }
    }

    pub fn load_checked(&self) -> Result<ProfileMap> {
        if !self.path.exists() {
            return Ok(ProfileMap::new());
        }
        let data = fs::read_to_string(&self.path).map_err(|e| self.read_error(e.to_string()))?;
        if data.trim().is_empty() {
            return Ok(ProfileMap::new());
        }
        serde_json::from_str(&data).map_err(|e| self.read_error(e.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<Profile> {
        self.load().remove(name)
    }

    pub fn save(&self, name: &str, profile: &Profile) -> Result<()> {
        let mut profiles = self.load_checked()?;
        profiles.insert(name.to_string(), profile.clone());
        self.write(&profiles)?;
        log::info!("Saved profile '{}' to {}", name, self.path.display());
        Ok(())
    }

    /// Removes `name`. Returns whether the profile existed.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let mut profiles = self.load_checked()?;
        let existed = profiles.remove(name).is_some();
        self.write(&profiles)?;
        log::info!("Deleted profile '{}' (existed: {})", name, existed);
        Ok(existed)
    }

    fn write(&self, profiles: &ProfileMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(profiles)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn read_error(&self, reason: String) -> LauncherError {
        LauncherError::StoreRead {
            path: self.path.clone(),
            reason,
        }
    }
}

/// Game directory the backend uses for `profile`.
///
/// Loader installs get a versioned id (`fabric-loader-0.15.11-1.20.4`), so the
/// newest matching directory is picked; plain `<version>` is the fallback.
pub fn instance_dir_for(instances_dir: &Path, profile: &Profile) -> PathBuf {
    let fallback = if profile.version.is_empty() {
        instances_dir.to_path_buf()
    } else {
        instances_dir.join(&profile.version)
    };
    if profile.modloader.is_vanilla() || profile.version.is_empty() {
        return fallback;
    }

    let loader = profile.modloader.as_str();
    let Ok(entries) = fs::read_dir(instances_dir) else {
        return fallback;
    };
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.contains(&profile.version) && n.to_lowercase().contains(loader))
                .unwrap_or(false)
        })
        .collect();
    candidates.sort();
    candidates.pop().unwrap_or(fallback)
}

/// Deletes `target` only if it is a directory strictly inside `instances_dir`.
/// Returns whether anything was removed.
pub fn remove_instance_dir(instances_dir: &Path, target: &Path) -> Result<bool> {
    if !target.is_dir() || !instances_dir.is_dir() {
        return Ok(false);
    }
    let base = dunce::canonicalize(instances_dir)?;
    let resolved = dunce::canonicalize(target)?;
    if resolved == base || !resolved.starts_with(&base) {
        log::warn!(
            "Refusing to delete {} outside of {}",
            resolved.display(),
            base.display()
        );
        return Ok(false);
    }
    fs::remove_dir_all(&resolved)?;
    log::info!("Removed instance directory {}", resolved.display());
    Ok(true)
}

/// Parses a RAM amount typed by the user, in MiB or as `<n>g`.
pub fn parse_ram(input: &str) -> u32 {
    let trimmed = input.trim().to_lowercase();
    if let Some(gigs) = trimmed.strip_suffix('g') {
        if let Ok(n) = gigs.parse::<u32>() {
            return n.saturating_mul(1024);
        }
    }
    let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
    match digits.parse::<u32>() {
        Ok(0) | Err(_) => MIN_RAM_MB,
        Ok(n) => n,
    }
}
