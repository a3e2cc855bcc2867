//! Request and response bodies of `POST /api/issue-vc`.

use samriddhi_core::{AccessToken, CredentialBundle, UserId};
use serde::{Deserialize, Serialize};

use crate::error::IssuanceApiError;

/// QR presentation mode requested from the issuer.
pub const QR_TYPE_PRESENTATION: &str = "presentation";

// -- Request ------------------------------------------------------------------

/// Request body for credential issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueVcRequest {
    pub full_name: String,
    pub nationality: String,
    /// Emergency contact, or the phone number when no emergency contact
    /// is on file.
    pub emergency_contact: String,
    pub user_id: UserId,
    pub options: IssueVcOptions,
}

/// Issuer-side rendering options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueVcOptions {
    pub qr_type: String,
    /// Public portal origin for verification links.
    pub base_url: String,
}

// -- Response -----------------------------------------------------------------

/// Response body for credential issuance, success or failure.
///
/// Every artifact field is optional on the wire; [`IssueVcResponse::into_bundle`]
/// decides whether a success response is complete.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueVcResponse {
    #[serde(default)]
    pub success: bool,
    pub vc_id: Option<String>,
    pub issuer_did: Option<String>,
    pub tourist_did: Option<String>,
    pub credential: Option<serde_json::Value>,
    pub qr_code: Option<String>,
    pub pdf: Option<PdfArtifact>,
    pub verification: Option<VerificationArtifact>,
    pub access_token: Option<String>,
    pub error: Option<String>,
    pub message: Option<String>,
}

/// Rendered credential document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfArtifact {
    pub download_url: Option<String>,
}

/// Public verification link.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationArtifact {
    pub verify_url: Option<String>,
}

impl IssueVcResponse {
    /// Convert a response into a credential bundle.
    ///
    /// A failure response becomes [`IssuanceApiError::Rejected`]. A success
    /// response with any of the seven artifact fields absent or blank becomes
    /// [`IssuanceApiError::IncompleteBundle`] listing the missing document keys.
    pub fn into_bundle(self) -> Result<CredentialBundle, IssuanceApiError> {
        if !self.success {
            return Err(IssuanceApiError::Rejected {
                message: self
                    .message
                    .or_else(|| self.error.clone())
                    .unwrap_or_else(|| "issuance failed".to_string()),
                error: self.error,
            });
        }

        let mut missing = Vec::new();
        let mut take = |value: Option<String>, key: &'static str| -> String {
            match value.filter(|v| !v.trim().is_empty()) {
                Some(v) => v,
                None => {
                    missing.push(key);
                    String::new()
                }
            }
        };

        let vc_id = take(self.vc_id, "vcId");
        let issuer_did = take(self.issuer_did, "issuerDid");
        let subject_did = take(self.tourist_did, "touristDid");
        let qr_code = take(self.qr_code, "vcQRCode");
        let document_url = take(self.pdf.and_then(|p| p.download_url), "vcPDFUrl");
        let verify_url = take(
            self.verification.and_then(|v| v.verify_url),
            "vcVerifyUrl",
        );
        let access_token = take(self.access_token, "vcAccessToken");

        if !missing.is_empty() {
            return Err(IssuanceApiError::IncompleteBundle { missing });
        }

        Ok(CredentialBundle {
            vc_id,
            issuer_did,
            subject_did,
            qr_code,
            document_url,
            verify_url,
            access_token: AccessToken::new(access_token),
            credential: self.credential.unwrap_or(serde_json::Value::Null),
        })
    }
}
