//! # Local Logger
//!
//! A `fern` dispatch for the `log` facade that writes to a timestamped file and,
//! optionally, to stdout. When the terminal is used to draw the display the
//! stdout chain is left out so log lines do not tear the screen.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Local;
use glob::glob;
use log::LevelFilter;
use thiserror::Error;

/// Failures while installing the logger.
#[derive(Debug, Error)]
pub enum LoggerError {
    /// Log directory or file could not be created.
    #[error("log file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The glob for old log files was invalid.
    #[error("invalid log file pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    /// A global logger was already installed.
    #[error("logger already initialised: {0}")]
    AlreadySet(#[from] log::SetLoggerError),
    /// Unknown level name.
    #[error("unknown log level '{0}'")]
    Level(String),
}

/// # Logger Local Options
///
/// Where and how log lines are written.
#[derive(Debug, Clone)]
pub struct LoggerLocalOptions {
    /// Prefix of the log file name.
    pub app_name: String,
    /// Directory for log files; created when missing.
    pub log_dir: PathBuf,
    /// Maximum level written.
    pub level: LevelFilter,
    /// Also write to stdout.
    pub to_stdout: bool,
}

impl Default for LoggerLocalOptions {
    fn default() -> Self {
        Self {
            app_name: "stop_display".to_string(),
            log_dir: PathBuf::from("./logs"),
            level: LevelFilter::Info,
            to_stdout: true,
        }
    }
}

/// Parses `trace|debug|info|warn|error|off`, case-insensitively.
pub fn parse_level(level: &str) -> Result<LevelFilter, LoggerError> {
    LevelFilter::from_str(level.trim()).map_err(|_| LoggerError::Level(level.to_string()))
}

/// Deletes all but the newest `{app_name}-*.log` file in `log_dir`.
///
/// File names carry a sortable timestamp, so the newest sorts last. Returns the
/// number of files removed.
pub fn rotate_logs(app_name: &str, log_dir: &Path) -> Result<usize, LoggerError> {
    let pattern = format!("{}/{}-*.log", log_dir.display(), app_name);
    let mut log_files: Vec<PathBuf> = glob(&pattern)?.filter_map(Result::ok).collect();
    log_files.sort();
    log_files.reverse();

    let mut removed = 0;
    for old_file in log_files.iter().skip(1) {
        match std::fs::remove_file(old_file) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!("Error deleting old log file {}: {}", old_file.display(), e),
        }
    }
    Ok(removed)
}

/// A fresh, timestamped log file path for `app_name`.
pub fn log_file_path(app_name: &str, log_dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    log_dir.join(format!("{app_name}-{timestamp}.log"))
}

/// Prepares the log directory and builds the dispatch without installing it.
///
/// Returns the dispatch and the file it writes to.
pub fn build_dispatch(options: &LoggerLocalOptions) -> Result<(fern::Dispatch, PathBuf), LoggerError> {
    std::fs::create_dir_all(&options.log_dir)?;
    rotate_logs(&options.app_name, &options.log_dir)?;
    let log_path = log_file_path(&options.app_name, &options.log_dir);

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(options.level)
        .chain(fern::log_file(&log_path)?);

    if options.to_stdout {
        dispatch = dispatch.chain(std::io::stdout());
    }
    Ok((dispatch, log_path))
}

/// Installs the logger globally. Returns the path of the log file.
pub fn setup_logging(options: &LoggerLocalOptions) -> Result<PathBuf, LoggerError> {
    let (dispatch, log_path) = build_dispatch(options)?;
    dispatch.apply()?;
    log::info!("Logging to {}", log_path.display());
    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!(parse_level("DEBUG").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level(" warn ").unwrap(), LevelFilter::Warn);
        assert!(matches!(parse_level("fatal"), Err(LoggerError::Level(_))));
    }

    #[test]
    fn rotation_keeps_only_the_newest_file() {
        let dir = tempfile::tempdir().unwrap();
        for stamp in ["20250101_000000", "20250102_000000", "20250103_000000"] {
            std::fs::write(dir.path().join(format!("kiosk-{stamp}.log")), "x").unwrap();
        }
        std::fs::write(dir.path().join("other-20250101_000000.log"), "x").unwrap();

        assert_eq!(rotate_logs("kiosk", dir.path()).unwrap(), 2);
        assert!(dir.path().join("kiosk-20250103_000000.log").exists());
        assert!(!dir.path().join("kiosk-20250101_000000.log").exists());
        assert!(dir.path().join("other-20250101_000000.log").exists());
    }
}
