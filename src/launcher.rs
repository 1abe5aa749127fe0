use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tokio::time::{Instant, sleep};

use crate::bootstrap::ReadinessCheck;
use crate::config::LauncherConfig;
use crate::error::{LauncherError, Result};
use crate::models::{LaunchRequest, Profile};

const BACKEND_SCRIPT: &str = "gwlauncher_backend.py";
const BACKEND_EXECUTABLE: &str = "gwlauncher_backend.exe";

/// How the backend gets executed on this platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStrategy {
    /// A self-contained executable.
    Native,
    /// A script run through an interpreter that has to be present and bootstrapped.
    Interpreter { program: String },
}

impl BackendStrategy {
    pub fn detect(python_program: &str) -> Self {
        if cfg!(target_os = "windows") {
            BackendStrategy::Native
        } else {
            BackendStrategy::Interpreter {
                program: python_program.to_string(),
            }
        }
    }

    pub fn needs_runtime(&self) -> bool {
        matches!(self, BackendStrategy::Interpreter { .. })
    }

    /// Locations probed for the backend, in priority order.
    pub fn candidates(&self, config: &LauncherConfig) -> Vec<PathBuf> {
        let mut candidates: Vec<PathBuf> = config.backend_override.iter().cloned().collect();
        match self {
            BackendStrategy::Native => {
                candidates.push(config.dev_root.join("dist").join(BACKEND_EXECUTABLE));
                candidates.push(config.resources_dir.join(BACKEND_EXECUTABLE));
            }
            BackendStrategy::Interpreter { .. } => {
                candidates.push(config.dev_root.join("src").join("python").join(BACKEND_SCRIPT));
                candidates.push(config.resources_dir.join("python").join(BACKEND_SCRIPT));
            }
        }
        candidates
    }
}

/// A backend location fixed once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBackend {
    pub strategy: BackendStrategy,
    pub path: PathBuf,
}

impl ResolvedBackend {
    pub fn resolve(config: &LauncherConfig) -> Result<Self> {
        Self::resolve_with(BackendStrategy::detect(&config.python_program), config)
    }

    pub fn resolve_with(strategy: BackendStrategy, config: &LauncherConfig) -> Result<Self> {
        let candidates = strategy.candidates(config);
        match candidates.iter().find(|path| path.is_file()) {
            Some(path) => {
                log::info!("Using backend at {}", path.display());
                Ok(Self {
                    path: path.clone(),
                    strategy,
                })
            }
            None => Err(LauncherError::BackendNotFound(candidates)),
        }
    }

    pub fn command(&self, request: &LaunchRequest) -> Command {
        let mut command = match &self.strategy {
            BackendStrategy::Native => {
                let mut command = Command::new(&self.path);
                if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
                    command.current_dir(dir);
                }
                command
            }
            BackendStrategy::Interpreter { program } => {
                let mut command = Command::new(program);
                command.arg(&self.path);
                command
            }
        };
        command.args(request.to_args());
        command
    }

    /// Starts the backend and returns without waiting for it.
    ///
    /// The child gets its own process group (a detached process on Windows),
    /// a null stdin and the launcher's stdout/stderr. It is never reaped, so
    /// it outlives the launcher.
    pub fn spawn_detached(&self, request: &LaunchRequest) -> Result<()> {
        let mut command = self.command(request);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const DETACHED_PROCESS: u32 = 0x00000008;
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
            command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
        }

        log::info!("Spawning backend: {:?}", command);
        let _child = command.spawn().map_err(|e| {
            log::error!("Failed to spawn backend {}: {}", self.path.display(), e);
            LauncherError::Spawn(e.to_string())
        })?;
        Ok(())
    }
}

/// Polls until `path` exists. A file left over from an earlier run counts.
pub async fn wait_for_file(path: &Path, interval: Duration, timeout: Duration) -> Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        if path.exists() {
            return Ok(());
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(LauncherError::Timeout {
                timeout,
                path: path.to_path_buf(),
            });
        }
        sleep(interval.min(deadline - now)).await;
    }
}

pub struct LaunchSupervisor<D> {
    config: LauncherConfig,
    backend: ResolvedBackend,
    readiness: D,
}

impl<D: ReadinessCheck> LaunchSupervisor<D> {
    pub fn new(config: LauncherConfig, readiness: D) -> Result<Self> {
        let backend = ResolvedBackend::resolve(&config)?;
        Ok(Self::with_backend(config, backend, readiness))
    }

    pub fn with_backend(config: LauncherConfig, backend: ResolvedBackend, readiness: D) -> Self {
        Self {
            config,
            backend,
            readiness,
        }
    }

    pub fn backend(&self) -> &ResolvedBackend {
        &self.backend
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    /// Starts the game for `profile` and returns once the backend is running.
    pub async fn launch(&self, profile: &Profile) -> Result<()> {
        if self.backend.strategy.needs_runtime() {
            self.readiness
                .check()
                .await
                .map_err(LauncherError::DependencyNotReady)?;
        }

        log::info!(
            "Launching {} {} for {}",
            profile.modloader,
            profile.version,
            profile.username
        );
        self.backend.spawn_detached(&LaunchRequest::from_profile(profile))
    }

    /// Asks the backend to rewrite the version source files and waits for
    /// the vanilla list to show up.
    pub async fn refresh_versions(&self) -> Result<()> {
        let output = self.config.catalog_output_file();
        self.backend.spawn_detached(&LaunchRequest::versions())?;
        log::info!("Waiting for {}", output.display());
        wait_for_file(&output, self.config.poll_interval, self.config.refresh_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModLoader;
    use std::fs;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> LauncherConfig {
        let mut config = LauncherConfig::with_base_dir(dir.path().join("home"));
        config.dev_root = dir.path().join("dev");
        config.resources_dir = dir.path().join("resources");
        config
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn interpreter() -> BackendStrategy {
        BackendStrategy::Interpreter {
            program: "python3".to_string(),
        }
    }

    #[test]
    fn missing_backend_lists_candidates() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        match ResolvedBackend::resolve_with(interpreter(), &config) {
            Err(LauncherError::BackendNotFound(paths)) => assert_eq!(paths.len(), 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn dev_path_wins_over_resources() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let dev = config.dev_root.join("src/python/gwlauncher_backend.py");
        let prod = config.resources_dir.join("python/gwlauncher_backend.py");
        touch(&prod);
        assert_eq!(ResolvedBackend::resolve_with(interpreter(), &config).unwrap().path, prod);
        touch(&dev);
        assert_eq!(ResolvedBackend::resolve_with(interpreter(), &config).unwrap().path, dev);
    }

    #[test]
    fn override_wins_over_everything() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        let custom = dir.path().join("custom/backend.exe");
        touch(&custom);
        touch(&config.dev_root.join("dist/gwlauncher_backend.exe"));
        config.backend_override = Some(custom.clone());
        let backend = ResolvedBackend::resolve_with(BackendStrategy::Native, &config).unwrap();
        assert_eq!(backend.path, custom);
    }

    #[test]
    fn interpreter_command_prefixes_script() {
        let backend = ResolvedBackend {
            strategy: interpreter(),
            path: PathBuf::from("/opt/gw/gwlauncher_backend.py"),
        };
        let profile = Profile {
            username: "Bob".to_string(),
            version: "1.20.4".to_string(),
            modloader: ModLoader::Vanilla,
            ram: 2048,
            jvm_flags: Vec::new(),
        };
        let command = backend.command(&LaunchRequest::from_profile(&profile));
        assert_eq!(command.get_program(), "python3");
        let args: Vec<_> = command.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec!["/opt/gw/gwlauncher_backend.py", "launch", "1.20.4", "Bob", "--ram", "2048", "--optimize"]
        );
        assert!(command.get_current_dir().is_none());
    }

    #[test]
    fn native_command_runs_from_backend_dir() {
        let backend = ResolvedBackend {
            strategy: BackendStrategy::Native,
            path: PathBuf::from("/opt/gw/gwlauncher_backend.exe"),
        };
        let command = backend.command(&LaunchRequest::versions());
        assert_eq!(command.get_current_dir(), Some(Path::new("/opt/gw")));
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, vec!["versions"]);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_times_out_no_sooner_than_timeout() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("never.json");
        let start = Instant::now();
        let result = wait_for_file(&target, Duration::from_millis(500), Duration::from_secs(60)).await;
        let elapsed = start.elapsed();

        assert!(matches!(result, Err(LauncherError::Timeout { .. })));
        assert!(elapsed >= Duration::from_secs(60));
        assert!(elapsed < Duration::from_secs(61));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_sees_file_created_later() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("versiones-minecraft.json");
        let writer = {
            let target = target.clone();
            tokio::spawn(async move {
                sleep(Duration::from_secs(2)).await;
                fs::write(&target, "[]").unwrap();
            })
        };

        let start = Instant::now();
        wait_for_file(&target, Duration::from_millis(500), Duration::from_secs(60))
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() <= Duration::from_millis(2500));
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn existing_file_counts_immediately() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("versiones-minecraft.json");
        fs::write(&target, "[]").unwrap();
        wait_for_file(&target, Duration::from_millis(500), Duration::from_millis(1))
            .await
            .unwrap();
    }
}
