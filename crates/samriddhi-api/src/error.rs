//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps dashboard, workflow, store and session errors to HTTP status
//! codes with a JSON body of error code, message, and optional details.
//! Store failures are logged and answered with a fixed message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use samriddhi_core::ValidationError;
use samriddhi_dashboard::{DashboardError, FormError, IssuanceError};
use samriddhi_store::{AuthError, StoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, never present for 500-class errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing, unknown or signed-out session (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The action conflicts with the profile's current state (409).
    #[error("{0}")]
    Conflict(String),

    /// An upstream service failed (502).
    #[error("{0}")]
    BadGateway(String),

    /// A credential was issued upstream but not recorded (500).
    #[error("credential {vc_id} was issued but could not be recorded: {reason}")]
    CredentialNotRecorded { vc_id: String, reason: String },

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// A 422 without details.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: None,
        }
    }

    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::BadGateway(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            Self::CredentialNotRecorded { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CREDENTIAL_NOT_RECORDED")
            }
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::CredentialNotRecorded { vc_id, .. } => {
                format!("credential {vc_id} was issued but could not be recorded")
            }
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "internal server error");
        } else if status == StatusCode::BAD_GATEWAY {
            tracing::warn!(error = %self, "upstream failure");
        }

        let details = match self {
            Self::Validation { details, .. } => details,
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Merge(e) => Self::Conflict(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidSession => Self::Unauthorized(err.to_string()),
            AuthError::Unavailable(_) => Self::BadGateway(err.to_string()),
        }
    }
}

impl From<IssuanceError> for AppError {
    fn from(err: IssuanceError) -> Self {
        let class = err.class().as_str();
        match err {
            IssuanceError::MissingProfileFields { ref missing } => Self::Validation {
                message: err.to_string(),
                details: Some(serde_json::json!({
                    "class": class,
                    "missing": missing.iter().map(ToString::to_string).collect::<Vec<_>>(),
                })),
            },
            IssuanceError::AlreadyIssued { .. } => Self::Conflict(err.to_string()),
            IssuanceError::EndpointUnreachable(_)
            | IssuanceError::EndpointRejected(_)
            | IssuanceError::IncompleteBundle { .. } => Self::BadGateway(err.to_string()),
            IssuanceError::StoreWrite { vc_id, source } => Self::CredentialNotRecorded {
                vc_id,
                reason: source.to_string(),
            },
            IssuanceError::StoreRead(source) => Self::Internal(source.to_string()),
        }
    }
}

impl From<FormError> for AppError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::AlreadySubmitting => Self::Conflict(err.to_string()),
            FormError::MissingFields(ref fields) => Self::Validation {
                message: err.to_string(),
                details: Some(serde_json::json!({
                    "missing": fields.iter().map(|f| f.name()).collect::<Vec<_>>(),
                })),
            },
            FormError::Invalid(e) => Self::from(e),
            FormError::Sink(msg) => Self::Internal(msg),
        }
    }
}

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::ActionUnavailable(_) | DashboardError::ViewClosed => {
                Self::Conflict(err.to_string())
            }
            DashboardError::Issuance(e) => e.into(),
            DashboardError::Form(e) => e.into(),
            DashboardError::Store(e) => e.into(),
        }
    }
}
