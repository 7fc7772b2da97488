//! Entity store error types
//!
//! Error codes:
//! - CONF_STORE_UNAVAILABLE (FATAL for the enclosing request)
//! - CONF_STORE_INVALID_QUERY (REJECT)
//! - CONF_STORE_CODEC (ERROR)

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures surfaced by an entity store adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store could not serve the request (timeout, outage, poisoned lock)
    #[error("Entity store unavailable: {0}")]
    Unavailable(String),

    /// Query violates the store's single-inequality or ordering rules
    #[error("Invalid store query: {0}")]
    InvalidQuery(String),

    /// Stored body could not be converted to or from its model
    #[error("Entity codec error for {key}: {reason}")]
    Codec { key: String, reason: String },
}

impl StoreError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        StoreError::Unavailable(reason.into())
    }

    pub fn invalid_query(reason: impl Into<String>) -> Self {
        StoreError::InvalidQuery(reason.into())
    }

    pub fn codec(key: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::Codec {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "CONF_STORE_UNAVAILABLE",
            StoreError::InvalidQuery(_) => "CONF_STORE_INVALID_QUERY",
            StoreError::Codec { .. } => "CONF_STORE_CODEC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(StoreError::unavailable("x").code(), "CONF_STORE_UNAVAILABLE");
        assert_eq!(StoreError::invalid_query("x").code(), "CONF_STORE_INVALID_QUERY");
        assert_eq!(StoreError::codec("k", "x").code(), "CONF_STORE_CODEC");
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::invalid_query("two inequality properties");
        assert!(err.to_string().contains("two inequality properties"));
    }
}
