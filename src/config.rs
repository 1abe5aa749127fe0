use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::ModLoader;

pub const PROFILES_FILE_NAME: &str = "ui_profiles.json";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(60);

// Launcher directory configuration
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub base_dir: PathBuf,
    pub profiles_file: PathBuf,
    pub instances_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub dev_root: PathBuf,
    pub resources_dir: PathBuf,
    pub backend_override: Option<PathBuf>,
    pub python_program: String,
    pub poll_interval: Duration,
    pub refresh_timeout: Duration,
}

impl LauncherConfig {
    pub fn new() -> Result<Self> {
        let base_dir = match env::var_os("GWLAUNCHER_HOME") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .context("No home directory found")?
                .join(".gwlauncher"),
        };

        let mut config = Self::with_base_dir(base_dir);
        config.dev_root = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        config.resources_dir = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(env!("GWLAUNCHER_RESOURCES_DIR"));
        config.backend_override = env::var_os("GWLAUNCHER_BACKEND").map(PathBuf::from);

        if let Ok(raw) = env::var("GWLAUNCHER_REFRESH_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid GWLAUNCHER_REFRESH_TIMEOUT_SECS: {}", raw))?;
            config.refresh_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Builds a config rooted at `base_dir` without consulting the environment.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            profiles_file: base_dir.join(PROFILES_FILE_NAME),
            instances_dir: base_dir.join("instances"),
            logs_dir: base_dir.join("logs"),
            dev_root: PathBuf::from("."),
            resources_dir: PathBuf::from(env!("GWLAUNCHER_RESOURCES_DIR")),
            backend_override: None,
            python_program: if cfg!(target_os = "windows") { "python" } else { "python3" }.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            base_dir,
        }
    }

    /// Version source files written by the backend, in merge order.
    pub fn version_sources(&self) -> [(ModLoader, PathBuf); 4] {
        [
            (ModLoader::Vanilla, self.base_dir.join("versiones-minecraft.json")),
            (ModLoader::Fabric, self.base_dir.join("versiones-fabric.json")),
            (ModLoader::Forge, self.base_dir.join("versiones-forge.json")),
            (ModLoader::Quilt, self.base_dir.join("versiones-quilt.json")),
        ]
    }

    // The vanilla list is the first file a `versions` run produces
    pub fn catalog_output_file(&self) -> PathBuf {
        self.base_dir.join("versiones-minecraft.json")
    }

    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(&self.instances_dir)?;
        std::fs::create_dir_all(&self.logs_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_every_path_from_base_dir() {
        let config = LauncherConfig::with_base_dir("/tmp/gw");
        assert_eq!(config.profiles_file, PathBuf::from("/tmp/gw/ui_profiles.json"));
        assert_eq!(config.instances_dir, PathBuf::from("/tmp/gw/instances"));
        assert_eq!(
            config.catalog_output_file(),
            PathBuf::from("/tmp/gw/versiones-minecraft.json")
        );
        let loaders: Vec<ModLoader> = config.version_sources().iter().map(|(l, _)| *l).collect();
        assert_eq!(
            loaders,
            vec![ModLoader::Vanilla, ModLoader::Fabric, ModLoader::Forge, ModLoader::Quilt]
        );
    }

    #[test]
    fn defaults_match_refresh_policy() {
        let config = LauncherConfig::with_base_dir("/tmp/gw");
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.refresh_timeout, Duration::from_secs(60));
        assert!(config.backend_override.is_none());
    }
}
