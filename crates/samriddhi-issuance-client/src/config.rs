//! Issuance client configuration.
//!
//! Points at the issuance service and carries the public portal URL that
//! the service embeds in verification links. Override via environment
//! variables or explicit construction for staging/testing.

use url::Url;
use zeroize::Zeroizing;

/// Configuration for connecting to the issuance service.
///
/// Custom `Debug` implementation redacts the `api_token` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct IssuanceConfig {
    /// Base URL of the issuance service. `api/issue-vc` is resolved
    /// relative to it.
    pub base_url: Url,
    /// Public origin of the portal, sent as `options.baseUrl` so the
    /// issuer can build verification links back to it.
    pub portal_url: Url,
    /// Optional bearer token for the issuance service.
    pub api_token: Option<Zeroizing<String>>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for IssuanceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuanceConfig")
            .field("base_url", &self.base_url)
            .field("portal_url", &self.portal_url)
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl IssuanceConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `ISSUANCE_BASE_URL` (default: `http://127.0.0.1:3000`)
    /// - `PORTAL_PUBLIC_URL` (default: `http://127.0.0.1:8080`)
    /// - `ISSUANCE_API_TOKEN` (optional)
    /// - `ISSUANCE_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: env_url("ISSUANCE_BASE_URL", "http://127.0.0.1:3000")?,
            portal_url: env_url("PORTAL_PUBLIC_URL", "http://127.0.0.1:8080")?,
            api_token: std::env::var("ISSUANCE_API_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty())
                .map(Zeroizing::new),
            timeout_secs: std::env::var("ISSUANCE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        })
    }

    /// Create a configuration pointing at a local mock server (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `base_url` cannot be parsed.
    pub fn local_mock(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: Url::parse(base_url)
                .map_err(|e| ConfigError::InvalidUrl(base_url.to_string(), e.to_string()))?,
            portal_url: Url::parse("http://127.0.0.1:8080")
                .map_err(|e| ConfigError::InvalidUrl("localhost".to_string(), e.to_string()))?,
            api_token: None,
            timeout_secs: 5,
        })
    }

    /// The issuance endpoint URL.
    pub fn issue_url(&self) -> Result<Url, ConfigError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join("api/issue-vc")
            .map_err(|e| ConfigError::InvalidUrl(self.base_url.to_string(), e.to_string()))
    }

    /// Origin of the portal URL, without a trailing slash.
    pub fn portal_origin(&self) -> String {
        self.portal_url.origin().ascii_serialization()
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("ISSUANCE_API_TOKEN is not a valid header value")]
    InvalidToken,
}
