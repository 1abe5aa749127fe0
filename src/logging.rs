use chrono::{DateTime, Local, TimeZone};
use log::{LevelFilter, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::LauncherConfig;

const KEPT_LOG_FILES: usize = 7;

pub struct Logger {
    file: Mutex<BufWriter<File>>,
    level: LevelFilter,
    echo: bool,
}

impl Logger {
    pub fn new(log_dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(log_dir)?;

        // One file per day
        let timestamp = Local::now().format("%Y-%m-%d");
        let log_file = log_dir.join(format!("launcher-{}.log", timestamp));

        let file = OpenOptions::new().create(true).append(true).open(log_file)?;

        Ok(Logger {
            file: Mutex::new(BufWriter::new(file)),
            level: LevelFilter::Info,
            echo: cfg!(debug_assertions),
        })
    }
}

/// Deletes all but the most recent log files. Names embed the date, so
/// lexicographic order is chronological.
pub fn prune_old_logs(log_dir: &Path, keep: usize) -> std::io::Result<Vec<PathBuf>> {
    if !log_dir.exists() {
        return Ok(Vec::new());
    }

    let mut log_files: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(log_dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("log") {
            log_files.push(path);
        }
    }

    log_files.sort_by(|a, b| b.cmp(a));
    let stale: Vec<PathBuf> = log_files.into_iter().skip(keep).collect();
    for path in &stale {
        std::fs::remove_file(path)?;
    }
    Ok(stale)
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(&Local::now(), record);

        if let Ok(mut file) = self.file.lock() {
            // The logger is never dropped, so nothing may stay buffered
            let _ = writeln!(file, "{}", line).and_then(|_| file.flush());
        }
        if self.echo {
            eprintln!("{}", line);
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// `[2024-05-01 12:00:00.000] WARN  gwlauncher_lib::profiles: message`
fn format_line<Tz: TimeZone>(now: &DateTime<Tz>, record: &Record) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "[{}] {:<5} {}: {}",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        record.level(),
        record.module_path().unwrap_or_else(|| record.target()),
        record.args()
    )
}

/// Installs the file logger, falling back to `env_logger` on stderr when the
/// log directory is unusable.
pub fn init_logging(config: &LauncherConfig) {
    match install_file_logger(&config.logs_dir) {
        Ok(()) => {
            log::info!("Logging system initialized");
            log::info!("Log directory: {:?}", config.logs_dir);
        }
        Err(e) => {
            let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .try_init();
            log::warn!("File logging unavailable ({}), logging to stderr", e);
        }
    }
}

fn install_file_logger(log_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let logger = Logger::new(log_dir)?;
    let level = logger.level;
    match prune_old_logs(log_dir, KEPT_LOG_FILES) {
        Ok(removed) if !removed.is_empty() => {
            eprintln!("Removed {} old log files", removed.len());
        }
        Ok(_) => {}
        Err(e) => eprintln!("Failed to prune old logs: {}", e),
    }

    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;
    use tempfile::TempDir;

    #[test]
    fn keeps_most_recent_logs() {
        let dir = TempDir::new().unwrap();
        for day in 1..=9 {
            std::fs::write(dir.path().join(format!("launcher-2024-01-0{}.log", day)), "").unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        let removed = prune_old_logs(dir.path(), 7).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!dir.path().join("launcher-2024-01-01.log").exists());
        assert!(!dir.path().join("launcher-2024-01-02.log").exists());
        assert!(dir.path().join("launcher-2024-01-09.log").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn formats_level_and_module() {
        let now = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let line = format_line(
            &now,
            &Record::builder()
                .args(format_args!("store unreadable"))
                .level(Level::Warn)
                .target("gwlauncher")
                .module_path(Some("gwlauncher_lib::profiles"))
                .build(),
        );
        assert_eq!(line, "[2024-05-01 12:30:00.000] WARN  gwlauncher_lib::profiles: store unreadable");
    }

    #[test]
    fn logger_creates_dated_file() {
        let dir = TempDir::new().unwrap();
        let log_dir = dir.path().join("logs");
        let _logger = Logger::new(&log_dir).unwrap();
        let name = format!("launcher-{}.log", Local::now().format("%Y-%m-%d"));
        assert!(log_dir.join(name).exists());
    }
}
