//! # samriddhi-issuance-client -- Typed Rust client for credential issuance
//!
//! Wraps the external issuance service that mints a verifiable credential
//! for a portal user and returns its artifacts (QR payload, PDF link,
//! verification link, access token).
//!
//! ## Architecture
//!
//! This crate is the only path from the portal to the issuance service.
//! The [`CredentialIssuer`] trait is the seam the credential workflow
//! depends on; [`IssuanceClient`] is the HTTP implementation.
//!
//! Requests are sent once. Failures are returned to the caller, who
//! decides whether to retry.

pub mod config;
pub mod error;
pub mod wire;

pub use config::{ConfigError, IssuanceConfig};
pub use error::IssuanceApiError;
pub use wire::{IssueVcOptions, IssueVcRequest, IssueVcResponse, QR_TYPE_PRESENTATION};

use std::future::Future;
use std::time::Duration;

use samriddhi_core::CredentialBundle;

const ENDPOINT: &str = "POST /api/issue-vc";

/// Something that can issue a credential for an [`IssueVcRequest`].
///
/// Implementations must be `Send + Sync` so the workflow can share them
/// across async tasks behind an `Arc`.
pub trait CredentialIssuer: Send + Sync {
    /// Issue a credential and return its complete artifact bundle.
    fn issue(
        &self,
        request: &IssueVcRequest,
    ) -> impl Future<Output = Result<CredentialBundle, IssuanceApiError>> + Send;

    /// Public portal origin to send as `options.baseUrl`.
    fn portal_origin(&self) -> String;
}

/// HTTP client for the issuance service.
#[derive(Debug, Clone)]
pub struct IssuanceClient {
    http: reqwest::Client,
    issue_url: url::Url,
    portal_origin: String,
}

impl IssuanceClient {
    /// Create a new issuance client from configuration.
    pub fn new(config: IssuanceConfig) -> Result<Self, IssuanceApiError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = &config.api_token {
            headers.insert(
                reqwest::header::AUTHORIZATION,
                reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
                    .map_err(|_| IssuanceApiError::Config(ConfigError::InvalidToken))?,
            );
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| IssuanceApiError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            issue_url: config.issue_url()?,
            portal_origin: config.portal_origin(),
        })
    }

    /// Issue a credential.
    ///
    /// Calls `POST {base_url}/api/issue-vc`. A non-2xx status with a
    /// `{success: false, message}` body is reported as
    /// [`IssuanceApiError::Rejected`]; any other non-2xx status as
    /// [`IssuanceApiError::ApiError`].
    pub async fn issue_vc(
        &self,
        req: &IssueVcRequest,
    ) -> Result<CredentialBundle, IssuanceApiError> {
        tracing::info!(user_id = %req.user_id, endpoint = ENDPOINT, "requesting credential issuance");

        let resp = self
            .http
            .post(self.issue_url.clone())
            .json(req)
            .send()
            .await
            .map_err(|e| IssuanceApiError::Http {
                endpoint: ENDPOINT.into(),
                source: e,
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| IssuanceApiError::Http {
            endpoint: ENDPOINT.into(),
            source: e,
        })?;

        if !status.is_success() {
            tracing::warn!(user_id = %req.user_id, status = status.as_u16(), "issuance endpoint returned an error status");
            return Err(match serde_json::from_str::<IssueVcResponse>(&body) {
                Ok(IssueVcResponse {
                    success: false,
                    error,
                    message: Some(message),
                    ..
                }) => IssuanceApiError::Rejected { error, message },
                _ => IssuanceApiError::ApiError {
                    endpoint: ENDPOINT.into(),
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let parsed: IssueVcResponse =
            serde_json::from_str(&body).map_err(|e| IssuanceApiError::Deserialization {
                endpoint: ENDPOINT.into(),
                source: e,
            })?;

        let bundle = parsed.into_bundle()?;
        tracing::info!(user_id = %req.user_id, vc_id = %bundle.vc_id, "credential issued");
        Ok(bundle)
    }
}

impl CredentialIssuer for IssuanceClient {
    async fn issue(&self, request: &IssueVcRequest) -> Result<CredentialBundle, IssuanceApiError> {
        self.issue_vc(request).await
    }

    fn portal_origin(&self) -> String {
        self.portal_origin.clone()
    }
}
