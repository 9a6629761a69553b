use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "SymptomSession";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable overriding the backend base URL.
pub const ENV_API_URL: &str = "SYMPTOM_SESSION_API_URL";
/// Environment variable overriding the HTTP timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "SYMPTOM_SESSION_TIMEOUT_SECS";

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "info,symptom_session_lib=debug"
}

/// Get the application data directory
/// ~/SymptomSession/ on all platforms, falling back to the working directory
/// when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Get the archived-session history file
pub fn history_path() -> PathBuf {
    app_data_dir().join("history.json")
}

/// Get the backend config file
pub fn config_path() -> PathBuf {
    app_data_dir().join("config.json")
}

/// Connection settings for the remote diagnostic assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl BackendConfig {
    /// Defaults, overlaid by the config file (if present), overlaid by the
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(&config_path())?;
        config.apply_overrides(
            std::env::var(ENV_API_URL).ok().as_deref(),
            std::env::var(ENV_TIMEOUT_SECS).ok().as_deref(),
        );
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn apply_overrides(&mut self, url: Option<&str>, timeout: Option<&str>) {
        if let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) {
            self.base_url = url.to_string();
        }
        if let Some(secs) = timeout.and_then(|t| t.trim().parse::<u64>().ok()) {
            self.timeout_secs = secs;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.base_url.clone()));
        }
        Ok(())
    }
}
