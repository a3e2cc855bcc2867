//! Issuance client error types.

/// Errors from calling the issuance endpoint.
#[derive(Debug, thiserror::Error)]
pub enum IssuanceApiError {
    /// Transport failure: connection refused, DNS, TLS, or timeout.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The endpoint returned a non-2xx status without a failure body.
    #[error("issuance endpoint {endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// The endpoint answered `success: false`.
    #[error("issuance rejected: {message}")]
    Rejected {
        /// Machine-oriented error string from the response, if any.
        error: Option<String>,
        /// Human-readable reason from the response.
        message: String,
    },
    /// The endpoint answered `success: true` but left bundle fields out.
    #[error("issuance response missing bundle fields: {}", missing.join(", "))]
    IncompleteBundle { missing: Vec<&'static str> },
    /// Response body was not the expected JSON.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: serde_json::Error,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl IssuanceApiError {
    /// Whether the endpoint could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Http { .. })
    }

    /// The message to show a user for a rejected issuance.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::ApiError { status, .. } => format!("issuance service returned HTTP {status}"),
            other => other.to_string(),
        }
    }
}
