//! Error types for analysis runs.
//!
//! Errors are classified by what the caller can do about them:
//! - Validation: the request itself is malformed; fix the request.
//! - NotFound: the referenced deal does not exist for that tenant.
//! - Internal: storage failures; retrying may help.

use thiserror::Error;

use crate::store::StoreError;

/// Everything that can stop an analysis run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Deal not found: {0}")]
    DealNotFound(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::MissingField(_) => ErrorKind::Validation,
            EngineError::DealNotFound(_) => ErrorKind::NotFound,
            EngineError::Store(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if retrying the same request might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Store(_))
    }
}

/// Serializable error representation for API responses.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub message: String,
    pub error_type: ErrorKind,
    pub can_retry: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Internal,
}

impl From<&EngineError> for ErrorReport {
    fn from(err: &EngineError) -> Self {
        let message = match err.kind() {
            // Storage detail stays in the logs; callers get a stable phrase.
            ErrorKind::Internal => "Failed to generate deal summary".to_string(),
            _ => err.to_string(),
        };

        ErrorReport {
            message,
            error_type: err.kind(),
            can_retry: err.is_retryable(),
        }
    }
}
