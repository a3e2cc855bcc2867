//! # Credential Bundle
//!
//! The artifacts the issuance endpoint returns for a successfully issued
//! verifiable credential, in the shape they are persisted on the profile
//! document.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

/// Bearer token handed out with an issued credential.
///
/// Held in zeroize-on-drop memory. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(Zeroizing<String>);

impl AccessToken {
    /// Wrap a token string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Expose the raw token. Callers must not log the result.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

impl Serialize for AccessToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for AccessToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// Artifacts of an issued credential.
///
/// Serialized with the document keys the profile store uses
/// (`vcId`, `issuerDid`, `touristDid`, ...), so a bundle flattens directly
/// into a [`UserProfile`](crate::UserProfile) document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialBundle {
    /// Credential identifier assigned by the issuer.
    #[serde(rename = "vcId")]
    pub vc_id: String,
    /// Identifier of the issuing party.
    #[serde(rename = "issuerDid")]
    pub issuer_did: String,
    /// Identifier of the credential subject (the portal user).
    #[serde(rename = "touristDid")]
    pub subject_did: String,
    /// Encoded visual-code (QR) payload for presentation.
    #[serde(rename = "vcQRCode")]
    pub qr_code: String,
    /// Download URL of the rendered credential document (PDF).
    #[serde(rename = "vcPDFUrl")]
    pub document_url: String,
    /// Public verification URL.
    #[serde(rename = "vcVerifyUrl")]
    pub verify_url: String,
    /// Access token for the verification URL.
    #[serde(rename = "vcAccessToken")]
    pub access_token: AccessToken,
    /// The raw credential document as returned by the issuer.
    #[serde(rename = "vcData", default)]
    pub credential: serde_json::Value,
}

impl CredentialBundle {
    /// Document keys of the seven required artifact fields, in display order.
    pub const ARTIFACT_KEYS: [&'static str; 7] = [
        "vcId",
        "issuerDid",
        "touristDid",
        "vcQRCode",
        "vcPDFUrl",
        "vcVerifyUrl",
        "vcAccessToken",
    ];
}
