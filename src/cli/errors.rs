//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero status.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::service::ServiceError;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Seed file unreadable or inconsistent
    #[error("Seed error: {0}")]
    Seed(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn seed(msg: impl Into<String>) -> Self {
        CliError::Seed(msg.into())
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(e) => e.code(),
            CliError::Seed(_) => "CONF_CLI_SEED_ERROR",
            CliError::Service(e) => e.code(),
            CliError::Io(_) => "CONF_CLI_IO_ERROR",
            CliError::Json(_) => "CONF_CLI_JSON_ERROR",
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
