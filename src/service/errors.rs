//! Service error types
//!
//! Error codes:
//! - CONF_SERVICE_NOT_FOUND (REJECT)
//! - CONF_SERVICE_FORBIDDEN (REJECT)
//! - CONF_SERVICE_CONFLICT (REJECT)
//! - CONF_SERVICE_BAD_REQUEST (REJECT)
//! - model, query and store errors keep their own codes

use thiserror::Error;

use crate::model::ModelError;
use crate::query::QueryError;
use crate::store::StoreError;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller does not own the entity
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Request clashes with current state (already registered, sold out)
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        ServiceError::Forbidden(reason.into())
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        ServiceError::Conflict(reason.into())
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        ServiceError::BadRequest(reason.into())
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "CONF_SERVICE_NOT_FOUND",
            ServiceError::Forbidden(_) => "CONF_SERVICE_FORBIDDEN",
            ServiceError::Conflict(_) => "CONF_SERVICE_CONFLICT",
            ServiceError::BadRequest(_) => "CONF_SERVICE_BAD_REQUEST",
            ServiceError::Model(e) => e.code(),
            ServiceError::Query(e) => e.code(),
            ServiceError::Store(e) => e.code(),
        }
    }

    /// True when the caller's input caused the failure
    pub fn is_client_fault(&self) -> bool {
        match self {
            ServiceError::Query(e) => e.is_client_fault(),
            ServiceError::Store(_) => false,
            _ => true,
        }
    }

    /// True when the backing store failed, directly or under the query engine
    pub fn is_store_failure(&self) -> bool {
        matches!(self, ServiceError::Store(_) | ServiceError::Query(QueryError::Store(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ServiceError::not_found("x").code(), "CONF_SERVICE_NOT_FOUND");
        assert_eq!(ServiceError::conflict("x").code(), "CONF_SERVICE_CONFLICT");
        assert_eq!(
            ServiceError::from(ModelError::MissingField("name")).code(),
            "CONF_MODEL_MISSING_FIELD"
        );
        assert_eq!(
            ServiceError::from(QueryError::invalid_window("x")).code(),
            "CONF_QUERY_INVALID_WINDOW"
        );
    }

    #[test]
    fn test_fault_classification() {
        assert!(ServiceError::forbidden("x").is_client_fault());
        assert!(ServiceError::from(QueryError::invalid_filter(0, "x")).is_client_fault());

        let store = ServiceError::from(QueryError::from(StoreError::unavailable("down")));
        assert!(!store.is_client_fault());
        assert!(store.is_store_failure());
        assert!(ServiceError::from(StoreError::unavailable("down")).is_store_failure());
    }
}
