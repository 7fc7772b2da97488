//! Model error types

use thiserror::Error;

/// Result type for model conversions
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while parsing keys or form values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Websafe key could not be decoded
    #[error("Invalid entity key: {0}")]
    InvalidKey(String),

    /// Date not in YYYY-MM-DD form
    #[error("Invalid date '{0}' - must be in YYYY-MM-DD format")]
    InvalidDate(String),

    /// Time not in HH:MM form
    #[error("Invalid time '{0}' - must be in HH:MM format")]
    InvalidTime(String),

    /// Required form field absent
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

impl ModelError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::InvalidKey(_) => "CONF_MODEL_INVALID_KEY",
            ModelError::InvalidDate(_) => "CONF_MODEL_INVALID_DATE",
            ModelError::InvalidTime(_) => "CONF_MODEL_INVALID_TIME",
            ModelError::MissingField(_) => "CONF_MODEL_MISSING_FIELD",
        }
    }
}
