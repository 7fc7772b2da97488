//! Service configuration
//!
//! Loaded from a JSON file; every field has a default so an empty object is
//! a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "CONF_CONFIG_IO",
            ConfigError::Parse { .. } => "CONF_CONFIG_PARSE",
            ConfigError::Invalid(_) => "CONF_CONFIG_INVALID",
        }
    }
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Conference service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Conferences with at most this many seats left are announced (default: 5)
    #[serde(default = "default_announcement_seat_threshold")]
    pub announcement_seat_threshold: i64,

    /// Session length in minutes when none is given (default: 30)
    #[serde(default = "default_session_duration")]
    pub default_session_duration: i64,

    /// Session type when none is given (default: "lecture")
    #[serde(default = "default_session_type")]
    pub default_session_type: String,

    /// City for conferences created without one (default: "Default City")
    #[serde(default = "default_city")]
    pub default_city: String,

    /// Topics for conferences created without any (default: ["Default", "Topic"])
    #[serde(default = "default_topics")]
    pub default_topics: Vec<String>,
}

fn default_announcement_seat_threshold() -> i64 {
    5
}

fn default_session_duration() -> i64 {
    30
}

fn default_session_type() -> String {
    "lecture".to_string()
}

fn default_city() -> String {
    "Default City".to_string()
}

fn default_topics() -> Vec<String> {
    vec!["Default".to_string(), "Topic".to_string()]
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            announcement_seat_threshold: default_announcement_seat_threshold(),
            default_session_duration: default_session_duration(),
            default_session_type: default_session_type(),
            default_city: default_city(),
            default_topics: default_topics(),
        }
    }
}

impl ServiceConfig {
    /// Reads and validates a JSON config file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ServiceConfig = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.announcement_seat_threshold <= 0 {
            return Err(ConfigError::Invalid(format!(
                "announcement_seat_threshold must be positive, got {}",
                self.announcement_seat_threshold
            )));
        }
        if self.default_session_duration <= 0 {
            return Err(ConfigError::Invalid(format!(
                "default_session_duration must be positive, got {}",
                self.default_session_duration
            )));
        }
        if self.default_session_type.trim().is_empty() {
            return Err(ConfigError::Invalid("default_session_type must not be empty".into()));
        }
        Ok(())
    }
}
