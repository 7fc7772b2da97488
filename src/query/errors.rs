//! Query engine error types
//!
//! Error codes:
//! - CONF_QUERY_INVALID_FILTER (REJECT)
//! - CONF_QUERY_MULTIPLE_INEQUALITY (REJECT)
//! - CONF_QUERY_INVALID_WINDOW (REJECT)
//! - CONF_STORE_* from the wrapped store error (FATAL for the request, never retried here)

use std::fmt;

use thiserror::Error;

use crate::store::StoreError;

use super::ast::Field;

/// Severity levels for query errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client input rejected
    Reject,
    /// Enclosing request fails
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Error)]
pub enum QueryError {
    /// Unknown field/operator token, or value not coercible
    #[error("Invalid filter at clause {index}: {reason}")]
    InvalidFilter { index: usize, reason: String },

    /// Two different fields requested inequality comparison
    #[error("Inequality filter is allowed on only one field: '{first}' already has one, '{second}' cannot")]
    MultipleInequalityFields { first: Field, second: Field },

    /// Bad window size, date or time
    #[error("Invalid time window: {0}")]
    InvalidWindow(String),

    /// Store adapter failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueryError {
    pub fn invalid_filter(index: usize, reason: impl Into<String>) -> Self {
        QueryError::InvalidFilter {
            index,
            reason: reason.into(),
        }
    }

    pub fn invalid_window(reason: impl Into<String>) -> Self {
        QueryError::InvalidWindow(reason.into())
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::InvalidFilter { .. } => "CONF_QUERY_INVALID_FILTER",
            QueryError::MultipleInequalityFields { .. } => "CONF_QUERY_MULTIPLE_INEQUALITY",
            QueryError::InvalidWindow(_) => "CONF_QUERY_INVALID_WINDOW",
            QueryError::Store(e) => e.code(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            QueryError::Store(_) => Severity::Fatal,
            _ => Severity::Reject,
        }
    }

    /// True when the caller's input caused the failure
    pub fn is_client_fault(&self) -> bool {
        self.severity() == Severity::Reject
    }
}
