//! Storage and authentication error types.

use samriddhi_core::ProfileMergeError;
use thiserror::Error;

/// Errors from reading or merging profile documents.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The merge violated a profile invariant; nothing was written.
    #[error("profile merge rejected: {0}")]
    Merge(#[from] ProfileMergeError),

    /// The stored document could not be decoded or encoded.
    #[error("profile document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The database call failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The backend is unavailable for a reason other than the above.
    #[error("profile store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the authentication service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No session matches the presented token.
    #[error("session is missing, expired or signed out")]
    InvalidSession,

    /// The authentication service could not be reached.
    #[error("authentication service unavailable: {0}")]
    Unavailable(String),
}
