//! # Hosted Authentication Client
//!
//! Resolves bearer tokens against the hosted authentication service with
//! token introspection, and revokes them on sign-out.
//!
//! - `POST {base_url}/v1/sessions/introspect` with `{"token": ...}`
//!   answers `{"active": bool, "sub": ..., "email": ...}`.
//! - `POST {base_url}/v1/sessions/revoke` with `{"token": ...}` ends the
//!   session. A 404 means it was already gone.
//!
//! Transport failures and unexpected statuses are
//! [`AuthError::Unavailable`]; an inactive token or a 401 is
//! [`AuthError::InvalidSession`].

use std::time::Duration;

use samriddhi_core::UserId;
use serde::{Deserialize, Serialize};
use url::Url;
use zeroize::Zeroizing;

use crate::auth::{AuthService, Session};
use crate::error::AuthError;

const INTROSPECT: &str = "v1/sessions/introspect";
const REVOKE: &str = "v1/sessions/revoke";

/// Configuration for the hosted authentication service.
///
/// `Debug` redacts the client secret.
#[derive(Clone)]
pub struct HostedAuthConfig {
    /// Base URL of the authentication service.
    pub base_url: Url,
    /// Optional bearer secret identifying the portal to the service.
    pub client_secret: Option<Zeroizing<String>>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for HostedAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedAuthConfig")
            .field("base_url", &self.base_url)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl HostedAuthConfig {
    /// Configuration pointing at `base_url` with no secret.
    ///
    /// # Errors
    ///
    /// [`AuthConfigError::InvalidUrl`] if `base_url` does not parse.
    pub fn new(base_url: &str) -> Result<Self, AuthConfigError> {
        Ok(Self {
            base_url: parse_base(base_url)?,
            client_secret: None,
            timeout_secs: 10,
        })
    }

    /// Load configuration from environment variables. `None` when
    /// `AUTH_BASE_URL` is unset or blank.
    ///
    /// Variables:
    /// - `AUTH_BASE_URL`
    /// - `AUTH_CLIENT_SECRET` (optional)
    /// - `AUTH_TIMEOUT_SECS` (default: 10)
    pub fn from_env() -> Result<Option<Self>, AuthConfigError> {
        let Some(base) = std::env::var("AUTH_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
        else {
            return Ok(None);
        };
        Ok(Some(Self {
            base_url: parse_base(base.trim())?,
            client_secret: std::env::var("AUTH_CLIENT_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(Zeroizing::new),
            timeout_secs: std::env::var("AUTH_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }))
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthConfigError> {
        self.base_url
            .join(path)
            .map_err(|e| AuthConfigError::InvalidUrl(self.base_url.to_string(), e.to_string()))
    }
}

// Ensures relative joins keep any base path.
fn parse_base(raw: &str) -> Result<Url, AuthConfigError> {
    let mut url =
        Url::parse(raw).map_err(|e| AuthConfigError::InvalidUrl(raw.to_string(), e.to_string()))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Hosted authentication configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("AUTH_CLIENT_SECRET is not a valid header value")]
    InvalidSecret,
    #[error("failed to build authentication client: {0}")]
    Client(String),
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct Introspection {
    active: bool,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// [`AuthService`] backed by the hosted authentication service.
#[derive(Debug, Clone)]
pub struct HostedAuthService {
    http: reqwest::Client,
    introspect_url: Url,
    revoke_url: Url,
}

impl HostedAuthService {
    /// Build the client.
    ///
    /// # Errors
    ///
    /// See [`AuthConfigError`].
    pub fn new(config: HostedAuthConfig) -> Result<Self, AuthConfigError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(secret) = &config.client_secret {
            let mut value =
                reqwest::header::HeaderValue::from_str(&format!("Bearer {}", secret.as_str()))
                    .map_err(|_| AuthConfigError::InvalidSecret)?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| AuthConfigError::Client(e.to_string()))?;

        Ok(Self {
            introspect_url: config.endpoint(INTROSPECT)?,
            revoke_url: config.endpoint(REVOKE)?,
            http,
        })
    }

    async fn post(&self, url: &Url, token: &str) -> Result<reqwest::Response, AuthError> {
        self.http
            .post(url.clone())
            .json(&TokenRequest { token })
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(endpoint = url.path(), error = %e, "authentication service unreachable");
                AuthError::Unavailable(e.to_string())
            })
    }
}

impl AuthService for HostedAuthService {
    async fn authenticate(&self, token: &str) -> Result<Session, AuthError> {
        let resp = self.post(&self.introspect_url, token).await?;
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AuthError::InvalidSession);
        }
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "token introspection failed");
            return Err(AuthError::Unavailable(format!(
                "introspection returned {status}"
            )));
        }

        let body: Introspection = resp
            .json()
            .await
            .map_err(|e| AuthError::Unavailable(format!("introspection response: {e}")))?;
        if !body.active {
            return Err(AuthError::InvalidSession);
        }
        let user_id = body
            .sub
            .as_deref()
            .and_then(|sub| UserId::new(sub).ok())
            .ok_or_else(|| {
                tracing::warn!("active introspection response without a usable subject");
                AuthError::InvalidSession
            })?;
        Ok(Session {
            user_id,
            email: body.email.filter(|e| !e.is_empty()),
        })
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let resp = self.post(&self.revoke_url, token).await?;
        let status = resp.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        tracing::warn!(status = status.as_u16(), "token revocation failed");
        Err(AuthError::Unavailable(format!("revocation returned {status}")))
    }
}
