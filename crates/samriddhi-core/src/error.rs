//! # Error Hierarchy
//!
//! Validation and merge errors for the core domain types. Each variant
//! carries the offending input so the caller can show it back to the user.

use thiserror::Error;

/// Validation errors for identifiers and form input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// User identifiers issued by the auth service are never empty.
    #[error("invalid user ID: must be non-empty")]
    EmptyUserId,

    /// A form write named a field the relief record does not have.
    #[error("unknown relief form field: \"{0}\"")]
    UnknownFormField(String),

    /// A select field received a value outside its option list.
    #[error("invalid value \"{value}\" for {field} (expected one of: {expected})")]
    InvalidOption {
        /// The select field name.
        field: &'static str,
        /// The rejected value.
        value: String,
        /// Comma-separated list of accepted values.
        expected: &'static str,
    },
}

/// Errors from merging a [`ProfileUpdate`](crate::ProfileUpdate) into a
/// stored profile.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileMergeError {
    /// The profile already carries an issued credential bundle. Issued
    /// bundles are history and are never replaced.
    #[error("profile already holds issued credential {existing_vc_id}")]
    CredentialAlreadyRecorded {
        /// The credential id already on the profile.
        existing_vc_id: String,
    },
}
