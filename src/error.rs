use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::bootstrap::BootstrapFailure;

#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("Backend executable not found (searched: {})", display_paths(.0))]
    BackendNotFound(Vec<PathBuf>),
    #[error("Failed to read version source {path}: {reason}")]
    SourceRead { path: PathBuf, reason: String },
    #[error("Profile store {path} is unreadable: {reason}")]
    StoreRead { path: PathBuf, reason: String },
    #[error("Launch dependencies are not ready ({} failed)", .0.step)]
    DependencyNotReady(BootstrapFailure),
    #[error("Timed out after {}s waiting for {}", .timeout.as_secs_f32(), .path.display())]
    Timeout { timeout: Duration, path: PathBuf },
    #[error("Failed to start backend: {0}")]
    Spawn(String),
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LauncherError>;

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
