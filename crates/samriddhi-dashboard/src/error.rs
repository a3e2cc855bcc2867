//! # Dashboard Errors
//!
//! Every failure the dashboard surfaces to a user falls into one of three
//! classes (see [`ErrorClass`]). None of them is retried automatically and
//! none is written to a durable audit trail; they are logged and returned.

use samriddhi_core::{ReliefField, RequiredField, ValidationError};
use samriddhi_issuance_client::IssuanceApiError;
use samriddhi_store::StoreError;
use thiserror::Error;

use crate::view::ActionKind;

/// Coarse error taxonomy shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The user's input is incomplete or not allowed. Fix and resubmit.
    Validation,
    /// The issuance endpoint or profile store could not complete the
    /// call. Retrying may succeed.
    Network,
    /// A credential exists at the issuer but was not recorded locally.
    /// No compensating action exists.
    StoreWrite,
}

impl ErrorClass {
    /// Stable lowercase name for logs and API bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Network => "network",
            Self::StoreWrite => "store_write",
        }
    }
}

/// Errors from [`CredentialWorkflow::issue_credential`](crate::CredentialWorkflow::issue_credential).
#[derive(Error, Debug)]
pub enum IssuanceError {
    /// Required profile fields are blank. No request was sent.
    #[error("complete your profile before issuing a credential; missing: {}", join(.missing))]
    MissingProfileFields {
        /// The missing fields, in form order.
        missing: Vec<RequiredField>,
    },

    /// The profile already holds an issued credential. No request was sent.
    #[error("credential {vc_id} has already been issued for this profile")]
    AlreadyIssued {
        /// The credential on record.
        vc_id: String,
    },

    /// The endpoint could not be reached or timed out.
    #[error("issuance service unreachable: {0}")]
    EndpointUnreachable(String),

    /// The endpoint answered but did not issue.
    #[error("failed to issue credential: {0}")]
    EndpointRejected(String),

    /// The endpoint claimed success but left artifacts out. Nothing was
    /// stored.
    #[error("issuance response is missing {}", .missing.join(", "))]
    IncompleteBundle {
        /// Document keys of the absent artifacts.
        missing: Vec<&'static str>,
    },

    /// The credential was issued but recording it failed.
    #[error("credential {vc_id} was issued but could not be recorded: {source}")]
    StoreWrite {
        /// Id of the credential that exists only at the issuer.
        vc_id: String,
        /// The store failure.
        #[source]
        source: StoreError,
    },

    /// The profile could not be loaded before issuance.
    #[error("could not load profile: {0}")]
    StoreRead(#[source] StoreError),
}

impl IssuanceError {
    /// The user-facing class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingProfileFields { .. } | Self::AlreadyIssued { .. } => {
                ErrorClass::Validation
            }
            Self::EndpointUnreachable(_)
            | Self::EndpointRejected(_)
            | Self::IncompleteBundle { .. }
            | Self::StoreRead(_) => ErrorClass::Network,
            Self::StoreWrite { .. } => ErrorClass::StoreWrite,
        }
    }
}

impl From<IssuanceApiError> for IssuanceError {
    fn from(err: IssuanceApiError) -> Self {
        match err {
            IssuanceApiError::IncompleteBundle { missing } => Self::IncompleteBundle { missing },
            other if other.is_unreachable() => Self::EndpointUnreachable(other.to_string()),
            IssuanceApiError::Config(e) => Self::EndpointUnreachable(e.to_string()),
            other => Self::EndpointRejected(other.user_message()),
        }
    }
}

fn join(missing: &[RequiredField]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn field_names(fields: &[ReliefField]) -> String {
    fields
        .iter()
        .map(ReliefField::name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors from submitting the relief verification form.
#[derive(Error, Debug)]
pub enum FormError {
    /// A submission is already in flight.
    #[error("a submission is already in progress")]
    AlreadySubmitting,

    /// Required fields are blank.
    #[error("required fields are blank: {}", field_names(.0))]
    MissingFields(Vec<ReliefField>),

    /// A field write was rejected.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The submission sink failed. The record is kept for resubmission.
    #[error("submission failed: {0}")]
    Sink(String),
}

/// Errors from dashboard actions other than issuance.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// The action card is disabled or already completed.
    #[error("action \"{}\" is not available", .0.label())]
    ActionUnavailable(ActionKind),

    /// The view was closed before the operation's result could be applied.
    #[error("dashboard view closed")]
    ViewClosed,

    /// Issuance failed.
    #[error(transparent)]
    Issuance(#[from] IssuanceError),

    /// The relief form submission failed.
    #[error(transparent)]
    Form(#[from] FormError),

    /// Reading or writing the profile failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
