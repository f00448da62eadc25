//! Approval errors.

use thiserror::Error;

/// Approval error types.
///
/// A key that matches no pending entry is not an error: resolution reports
/// absence through `Option`/`bool` return values.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// Text could not be decoded (or a value could not be encoded).
    #[error("Malformed encoding: {0}")]
    MalformedEncoding(String),

    /// The backing store could not be reached or failed the operation.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A reserved approval argument carried an unusable value.
    #[error("Invalid value for {field}: {message}")]
    InvalidOption { field: String, message: String },

    /// No destination queue is known for a job class.
    #[error("No destination queue for job class: {0}")]
    UnknownDestination(String),
}

/// Result alias used throughout the crate.
pub type ApprovalResult<T> = Result<T, ApprovalError>;

impl From<serde_json::Error> for ApprovalError {
    fn from(err: serde_json::Error) -> Self {
        ApprovalError::MalformedEncoding(err.to_string())
    }
}

impl From<std::io::Error> for ApprovalError {
    fn from(err: std::io::Error) -> Self {
        ApprovalError::StorageUnavailable(err.to_string())
    }
}
