use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use lib_kiosk::core::{CappedBackoff, FixedInterval, PollPolicy};
use lib_kiosk::display::{ComposeOptions, Language, SessionConfig};
use lib_kiosk::loggers::parse_level;
use lib_kiosk::utils::MediaResolver;
use log::LevelFilter;
use thiserror::Error;
use url::Url;

/// Default config file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "stop_display.conf";

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[clap(about = "Bus-stop kiosk display", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "KIOSK_STOP_ID", help = "Stop whose arrivals are displayed.")]
    pub stop_id: Option<String>,

    #[clap(long, env = "KIOSK_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "KIOSK_API_BASE_URL", help = "Base URL of the backend API.")]
    pub api_base_url: Option<String>,

    #[clap(long, env = "KIOSK_MEDIA_BASE_URL", help = "Base URL for relative image paths (default: API origin).")]
    pub media_base_url: Option<String>,

    #[clap(long, env = "KIOSK_ARRIVALS_INTERVAL_SECONDS", help = "Seconds between arrivals refreshes.")]
    pub arrivals_interval_seconds: Option<u64>,

    #[clap(long, env = "KIOSK_CONTENT_INTERVAL_SECONDS", help = "Seconds between content refreshes.")]
    pub content_interval_seconds: Option<u64>,

    #[clap(long, env = "KIOSK_REQUEST_TIMEOUT_SECONDS", help = "Per-request timeout in seconds.")]
    pub request_timeout_seconds: Option<u64>,

    #[clap(long, env = "KIOSK_BACKOFF_MAX_SECONDS", help = "Enable capped exponential backoff up to this many seconds.")]
    pub backoff_max_seconds: Option<u64>,

    #[clap(long, env = "KIOSK_TIMEZONE", help = "IANA timezone for the clock.")]
    pub timezone: Option<String>,

    #[clap(long, env = "KIOSK_LANGUAGE", help = "News language: el, en or both.")]
    pub language: Option<String>,

    #[clap(long, env = "KIOSK_RENDER", help = "Output: tty (draw the display) or log (one line per change).")]
    pub render: Option<String>,

    #[clap(long, env = "KIOSK_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "KIOSK_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            stop_id: other.stop_id.or(self.stop_id),
            config_path: other.config_path.or(self.config_path),
            api_base_url: other.api_base_url.or(self.api_base_url),
            media_base_url: other.media_base_url.or(self.media_base_url),
            arrivals_interval_seconds: other.arrivals_interval_seconds.or(self.arrivals_interval_seconds),
            content_interval_seconds: other.content_interval_seconds.or(self.content_interval_seconds),
            request_timeout_seconds: other.request_timeout_seconds.or(self.request_timeout_seconds),
            backoff_max_seconds: other.backoff_max_seconds.or(self.backoff_max_seconds),
            timezone: other.timezone.or(self.timezone),
            language: other.language.or(self.language),
            render: other.render.or(self.render),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
        }
    }

    fn defaults() -> Config {
        Config {
            api_base_url: Some("http://localhost:8000/api/".to_string()),
            arrivals_interval_seconds: Some(30),
            content_interval_seconds: Some(300),
            request_timeout_seconds: Some(10),
            timezone: Some("Asia/Nicosia".to_string()),
            language: Some("both".to_string()),
            render: Some("tty".to_string()),
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no stop id configured (set --stop-id, KIOSK_STOP_ID or stopId)")]
    MissingStopId,

    #[error("cannot read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("cannot parse config file {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("{field} is not a usable http(s) URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("unknown timezone '{0}'")]
    InvalidTimezone(String),

    #[error("{0}")]
    InvalidLanguage(String),

    #[error("unknown render mode '{0}' (expected tty or log)")]
    InvalidRender(String),

    #[error("unknown log level '{0}'")]
    InvalidLogLevel(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Tty,
    Log,
}

impl FromStr for RenderMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tty" => Ok(RenderMode::Tty),
            "log" => Ok(RenderMode::Log),
            _ => Err(ConfigError::InvalidRender(s.to_string())),
        }
    }
}

/// Validated settings the binary runs with.
#[derive(Debug, Clone)]
pub struct Settings {
    pub stop_id: String,
    pub api_base_url: Url,
    pub media_base_url: Url,
    pub arrivals_interval: Duration,
    pub content_interval: Duration,
    pub request_timeout: Duration,
    pub backoff_max: Option<Duration>,
    pub timezone: Tz,
    pub language: Language,
    pub render: RenderMode,
    pub log_dir: PathBuf,
    pub log_level: LevelFilter,
}

impl Settings {
    fn policy(&self, interval: Duration) -> Arc<dyn PollPolicy> {
        match self.backoff_max {
            Some(max) => Arc::new(CappedBackoff { base: interval, max: max.max(interval) }),
            None => Arc::new(FixedInterval(interval)),
        }
    }

    pub fn session_config(&self, media: MediaResolver) -> SessionConfig {
        SessionConfig {
            arrivals_policy: self.policy(self.arrivals_interval),
            content_policy: self.policy(self.content_interval),
            compose: ComposeOptions { language: self.language, timezone: self.timezone, media },
            ..SessionConfig::new(self.stop_id.clone())
        }
    }
}

fn http_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::InvalidUrl { field, value: value.to_string() };
    let mut url = Url::parse(value.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(invalid());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn seconds(field: &'static str, value: Option<u64>) -> Result<Duration, ConfigError> {
    match value {
        Some(s) if s > 0 => Ok(Duration::from_secs(s)),
        _ => Err(ConfigError::ZeroInterval(field)),
    }
}

pub fn validate(config: Config) -> Result<Settings, ConfigError> {
    let stop_id = config
        .stop_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(ConfigError::MissingStopId)?;

    let api_base_url = http_url("apiBaseUrl", config.api_base_url.as_deref().unwrap_or_default())?;
    let media_base_url = match config.media_base_url.as_deref() {
        Some(media) => http_url("mediaBaseUrl", media)?,
        None => {
            let mut origin = api_base_url.clone();
            origin.set_path("/");
            origin
        }
    };

    let timezone_name = config.timezone.unwrap_or_default();
    let timezone = timezone_name
        .trim()
        .parse::<Tz>()
        .map_err(|_| ConfigError::InvalidTimezone(timezone_name.clone()))?;

    let language = config
        .language
        .as_deref()
        .map(Language::from_str)
        .transpose()
        .map_err(ConfigError::InvalidLanguage)?
        .unwrap_or_default();

    let render = config.render.as_deref().map(RenderMode::from_str).transpose()?.unwrap_or(RenderMode::Tty);

    let level_name = config.log_level.unwrap_or_else(|| "info".to_string());
    let log_level = parse_level(&level_name).map_err(|_| ConfigError::InvalidLogLevel(level_name.clone()))?;

    Ok(Settings {
        stop_id,
        api_base_url,
        media_base_url,
        arrivals_interval: seconds("arrivalsIntervalSeconds", config.arrivals_interval_seconds)?,
        content_interval: seconds("contentIntervalSeconds", config.content_interval_seconds)?,
        request_timeout: seconds("requestTimeoutSeconds", config.request_timeout_seconds)?,
        backoff_max: config.backoff_max_seconds.filter(|s| *s > 0).map(Duration::from_secs),
        timezone,
        language,
        render,
        log_dir: config.log_dir.unwrap_or_else(|| PathBuf::from("./logs")),
        log_level,
    })
}

fn read_file(path: &Path) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

/// Layers defaults, the config file and `cli` (which already carries env vars).
pub fn resolve(cli: Config) -> Result<Settings, ConfigError> {
    // 1. Load defaults
    let mut current_config = Config::defaults();

    // 2. Load from the config file if present. An explicit path must exist.
    match cli.config_path.clone() {
        Some(path) => current_config = current_config.merge(read_file(&path)?),
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if path.exists() {
                current_config = current_config.merge(read_file(&path)?);
            }
        }
    }

    // 3. Override with environment variables and CLI arguments
    validate(current_config.merge(cli))
}

pub fn load_config() -> Result<Settings, ConfigError> {
    resolve(Config::parse())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(stop: &str) -> Config {
        Config { stop_id: Some(stop.to_string()), ..Default::default() }
    }

    #[test]
    fn defaults_apply_with_only_a_stop_id() {
        let settings = validate(Config::defaults().merge(cli("6300"))).unwrap();
        assert_eq!(settings.stop_id, "6300");
        assert_eq!(settings.api_base_url.as_str(), "http://localhost:8000/api/");
        assert_eq!(settings.media_base_url.as_str(), "http://localhost:8000/");
        assert_eq!(settings.arrivals_interval, Duration::from_secs(30));
        assert_eq!(settings.content_interval, Duration::from_secs(300));
        assert_eq!(settings.timezone, chrono_tz::Asia::Nicosia);
        assert_eq!(settings.language, Language::Both);
        assert_eq!(settings.render, RenderMode::Tty);
        assert_eq!(settings.log_level, LevelFilter::Info);
        assert!(settings.backoff_max.is_none());
    }

    #[test]
    fn file_values_are_overridden_by_cli() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kiosk.conf");
        fs::write(
            &path,
            r#"{"stopId": "4338", "apiBaseUrl": "https://transit.example/api", "language": "en", "backoffMaxSeconds": 600}"#,
        )
        .unwrap();

        let settings = resolve(Config { config_path: Some(path), ..cli("6300") }).unwrap();
        assert_eq!(settings.stop_id, "6300");
        assert_eq!(settings.api_base_url.as_str(), "https://transit.example/api/");
        assert_eq!(settings.language, Language::En);
        assert_eq!(settings.backoff_max, Some(Duration::from_secs(600)));
    }

    #[test]
    fn invalid_values_are_reported() {
        let base = || Config::defaults().merge(cli("6300"));

        assert!(matches!(validate(Config::defaults()), Err(ConfigError::MissingStopId)));
        assert!(matches!(
            validate(Config { api_base_url: Some("ftp://x/".into()), ..base() }),
            Err(ConfigError::InvalidUrl { field: "apiBaseUrl", .. })
        ));
        assert!(matches!(
            validate(Config { timezone: Some("Mars/Olympus".into()), ..base() }),
            Err(ConfigError::InvalidTimezone(_))
        ));
        assert!(matches!(
            validate(Config { arrivals_interval_seconds: Some(0), ..base() }),
            Err(ConfigError::ZeroInterval("arrivalsIntervalSeconds"))
        ));
        assert!(matches!(validate(Config { language: Some("fr".into()), ..base() }), Err(ConfigError::InvalidLanguage(_))));
        assert!(matches!(validate(Config { render: Some("gui".into()), ..base() }), Err(ConfigError::InvalidRender(_))));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = resolve(Config { config_path: Some(PathBuf::from("/nonexistent/kiosk.conf")), ..cli("6300") });
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
