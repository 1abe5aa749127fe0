use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::process::Stdio;
use tokio::process::Command;

use crate::events::{Prompt, Prompter};
use crate::utils::open_url;

pub const PYTHON_DOWNLOAD_URL: &str = "https://www.python.org/downloads/";
const BACKEND_PACKAGES: [&str; 2] = ["minecraft-launcher-lib", "requests"];
const LIBRARY_PROBE: &str = "import minecraft_launcher_lib, requests";

// Package manager, install arguments, Tk package name
const PACKAGE_MANAGERS: [(&str, &[&str], &str); 3] = [
    ("apt-get", &["install", "-y"], "python3-tk"),
    ("dnf", &["install", "-y"], "python3-tkinter"),
    ("pacman", &["-S", "--noconfirm"], "tk"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BootstrapStep {
    CheckRuntime,
    CheckLibraries,
    InstallLibraries,
    PlatformExtras,
    Reverify,
}

impl fmt::Display for BootstrapStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BootstrapStep::CheckRuntime => "check-runtime",
            BootstrapStep::CheckLibraries => "check-libraries",
            BootstrapStep::InstallLibraries => "install-libraries",
            BootstrapStep::PlatformExtras => "platform-extras",
            BootstrapStep::Reverify => "reverify",
        };
        f.write_str(name)
    }
}

/// Why the runtime is not ready, and what the user can do about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapFailure {
    pub step: BootstrapStep,
    pub remediation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerOutput {
    pub status_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RunnerOutput {
    pub fn success(&self) -> bool {
        self.status_code == Some(0)
    }
}

/// Runs an external command to completion. Errors mean the command could
/// not be started at all.
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        program: &str,
        args: &[String],
    ) -> impl Future<Output = Result<RunnerOutput, String>> + Send;
}

#[derive(Debug, Default, Clone)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<RunnerOutput, String> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| format!("Failed to execute {}: {}", program, e))?;

        Ok(RunnerOutput {
            status_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Gate run before anything that needs the interpreter runtime.
pub trait ReadinessCheck: Send + Sync {
    fn check(&self) -> impl Future<Output = Result<(), BootstrapFailure>> + Send;
}

pub struct Bootstrapper<R, P> {
    runner: R,
    prompter: P,
    python: String,
    platform: Platform,
}

impl<R: CommandRunner, P: Prompter> Bootstrapper<R, P> {
    pub fn new(runner: R, prompter: P, python: impl Into<String>) -> Self {
        Self {
            runner,
            prompter,
            python: python.into(),
            platform: Platform::current(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub async fn ensure_ready(&self) -> bool {
        self.run_checks().await.is_ok()
    }

    /// Walks the readiness steps once. Library installation happens at most
    /// once and is followed by a single re-check.
    pub async fn run_checks(&self) -> Result<(), BootstrapFailure> {
        if let Err(reason) = self.run_step(&self.python, &["--version"]).await {
            return Err(self.runtime_missing(reason));
        }

        match self.probe_libraries().await {
            Ok(()) => {
                log::info!("Backend libraries already installed");
                return Ok(());
            }
            Err(reason) => log::info!("Backend libraries missing, installing: {}", reason),
        }

        let install_args = self.install_args();
        let install_refs: Vec<&str> = install_args.iter().map(String::as_str).collect();
        if let Err(reason) = self.run_step(&self.python, &install_refs).await {
            let remediation = format!(
                "Install the libraries manually with:\n  {} {}",
                self.python,
                install_args.join(" ")
            );
            return Err(self.fail(BootstrapStep::InstallLibraries, reason, remediation));
        }

        if self.platform == Platform::Linux {
            self.install_platform_extras().await?;
        }

        if let Err(reason) = self.probe_libraries().await {
            let remediation = format!(
                "The libraries were installed but {} still cannot import them. Check which Python installation is on your PATH.",
                self.python
            );
            return Err(self.fail(BootstrapStep::Reverify, reason, remediation));
        }

        log::info!("Backend dependencies installed");
        Ok(())
    }

    fn install_args(&self) -> Vec<String> {
        let mut args = vec!["-m".to_string(), "pip".to_string(), "install".to_string()];
        if self.platform != Platform::Windows {
            args.push("--user".to_string());
        }
        if self.platform == Platform::Linux {
            args.push("--break-system-packages".to_string());
        }
        args.extend(BACKEND_PACKAGES.iter().map(|p| p.to_string()));
        args
    }

    async fn probe_libraries(&self) -> Result<(), String> {
        self.run_step(&self.python, &["-c", LIBRARY_PROBE]).await
    }

    async fn install_platform_extras(&self) -> Result<(), BootstrapFailure> {
        let mut detected = None;
        for (manager, install, package) in PACKAGE_MANAGERS {
            if self.run_step(manager, &["--version"]).await.is_ok() {
                detected = Some((manager, install, package));
                break;
            }
        }

        let Some((manager, install, package)) = detected else {
            return Err(self.fail(
                BootstrapStep::PlatformExtras,
                "no supported package manager found".to_string(),
                "Install the Tk bindings for Python (python3-tk or equivalent) with your package manager.".to_string(),
            ));
        };

        let mut args = vec![manager];
        args.extend_from_slice(install);
        args.push(package);
        log::info!("Installing {} with {}", package, manager);
        if let Err(reason) = self.run_step("pkexec", &args).await {
            let remediation = format!("Install it manually with:\n  sudo {}", args.join(" "));
            return Err(self.fail(BootstrapStep::PlatformExtras, reason, remediation));
        }
        Ok(())
    }

    async fn run_step(&self, program: &str, args: &[&str]) -> Result<(), String> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let output = self.runner.run(program, &args).await?;
        if output.success() {
            Ok(())
        } else {
            let stderr = output.stderr.trim();
            Err(match output.status_code {
                Some(code) => format!("{} exited with status {}: {}", program, code, stderr),
                None => format!("{} was terminated: {}", program, stderr),
            })
        }
    }

    fn runtime_missing(&self, reason: String) -> BootstrapFailure {
        log::error!("Bootstrap step {} failed: {}", BootstrapStep::CheckRuntime, reason);
        let remediation = format!(
            "Python 3 is required to run the launcher backend. Download it from {}",
            PYTHON_DOWNLOAD_URL
        );
        let prompt = Prompt::choice("Python not found", remediation.clone(), "Open download page");
        if self.prompter.prompt(&prompt) {
            if let Err(e) = open_url(PYTHON_DOWNLOAD_URL) {
                log::warn!("{}", e);
            }
        }
        BootstrapFailure {
            step: BootstrapStep::CheckRuntime,
            remediation,
        }
    }

    fn fail(&self, step: BootstrapStep, reason: String, remediation: String) -> BootstrapFailure {
        log::error!("Bootstrap step {} failed: {}", step, reason);
        self.prompter
            .prompt(&Prompt::info("Missing dependencies", remediation.clone()));
        BootstrapFailure { step, remediation }
    }
}

impl<R: CommandRunner, P: Prompter> ReadinessCheck for Bootstrapper<R, P> {
    async fn check(&self) -> Result<(), BootstrapFailure> {
        self.run_checks().await
    }
}
