//! # Profile Document
//!
//! One [`UserProfile`] per authenticated user. The document is written by
//! partial merges ([`ProfileUpdate`]); only fields present in an update are
//! touched.
//!
//! ## Merge Invariants
//!
//! - `identityVerified`, `credentialIssued` and `infoCaptured` only move from
//!   `false` to `true`. [`ProfileUpdate`] has no way to express a reset.
//! - Credential artifact fields are absent until `credentialIssued` is true,
//!   and once recorded they are never replaced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credential::CredentialBundle;
use crate::error::ProfileMergeError;

/// Display value for identity fields that are absent or blank.
pub const NOT_PROVIDED: &str = "Not provided";

/// User-editable identity fields of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProfileField {
    /// Full legal name.
    FullName,
    /// Nationality.
    Nationality,
    /// Phone number.
    Phone,
    /// Emergency contact number.
    EmergencyContact,
    /// Postal address.
    Address,
    /// Date of birth.
    DateOfBirth,
}

impl ProfileField {
    /// Every identity field, in document order.
    pub const ALL: [ProfileField; 6] = [
        Self::FullName,
        Self::Nationality,
        Self::Phone,
        Self::EmergencyContact,
        Self::Address,
        Self::DateOfBirth,
    ];

    /// Key of this field in the stored document.
    pub fn document_key(&self) -> &'static str {
        match self {
            Self::FullName => "fullName",
            Self::Nationality => "nationality",
            Self::Phone => "phone",
            Self::EmergencyContact => "emergencyContact",
            Self::Address => "address",
            Self::DateOfBirth => "dateOfBirth",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FullName => "Full Name",
            Self::Nationality => "Nationality",
            Self::Phone => "Phone",
            Self::EmergencyContact => "Emergency Contact",
            Self::Address => "Address",
            Self::DateOfBirth => "Date of Birth",
        }
    }
}

impl std::fmt::Display for ProfileField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.document_key())
    }
}

/// Profile data the issuance endpoint requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequiredField {
    /// Non-blank full name.
    FullName,
    /// Non-blank nationality.
    Nationality,
    /// Non-blank emergency contact or, failing that, phone.
    Contact,
}

impl std::fmt::Display for RequiredField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FullName => f.write_str("full name"),
            Self::Nationality => f.write_str("nationality"),
            Self::Contact => f.write_str("phone or emergency contact"),
        }
    }
}

/// The persisted per-user profile document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Full legal name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Nationality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    /// Phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Emergency contact number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    /// Postal address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Date of birth, as entered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,

    #[serde(rename = "didCreated", default)]
    identity_verified: bool,
    #[serde(rename = "didCreatedAt", default, skip_serializing_if = "Option::is_none")]
    identity_verified_at: Option<DateTime<Utc>>,
    #[serde(rename = "vcIssued", default)]
    credential_issued: bool,
    #[serde(rename = "vcIssuedAt", default, skip_serializing_if = "Option::is_none")]
    credential_issued_at: Option<DateTime<Utc>>,
    #[serde(rename = "touristInfoCaptured", default)]
    info_captured: bool,
    #[serde(flatten)]
    credential: Option<CredentialBundle>,
}

impl UserProfile {
    /// An empty profile: no identity fields, all flags false.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether e-KYC identity verification has completed.
    pub fn identity_verified(&self) -> bool {
        self.identity_verified
    }

    /// When identity verification completed.
    pub fn identity_verified_at(&self) -> Option<DateTime<Utc>> {
        self.identity_verified_at
    }

    /// Whether a credential has been issued and recorded.
    pub fn credential_issued(&self) -> bool {
        self.credential_issued
    }

    /// When the credential was recorded.
    pub fn credential_issued_at(&self) -> Option<DateTime<Utc>> {
        self.credential_issued_at
    }

    /// Whether case/relief information has been captured.
    pub fn info_captured(&self) -> bool {
        self.info_captured
    }

    /// The issued credential bundle, present iff [`credential_issued`](Self::credential_issued).
    pub fn credential(&self) -> Option<&CredentialBundle> {
        self.credential.as_ref()
    }

    /// Raw value of an identity field.
    pub fn field(&self, field: ProfileField) -> Option<&str> {
        let value = match field {
            ProfileField::FullName => &self.full_name,
            ProfileField::Nationality => &self.nationality,
            ProfileField::Phone => &self.phone,
            ProfileField::EmergencyContact => &self.emergency_contact,
            ProfileField::Address => &self.address,
            ProfileField::DateOfBirth => &self.date_of_birth,
        };
        value.as_deref()
    }

    /// Identity field with blank values treated as absent.
    pub fn provided(&self, field: ProfileField) -> Option<&str> {
        self.field(field).map(str::trim).filter(|s| !s.is_empty())
    }

    /// Identity field for display, falling back to [`NOT_PROVIDED`].
    pub fn display(&self, field: ProfileField) -> &str {
        self.provided(field).unwrap_or(NOT_PROVIDED)
    }

    /// Contact number for issuance: emergency contact first, phone second.
    pub fn issuance_contact(&self) -> Option<&str> {
        self.provided(ProfileField::EmergencyContact)
            .or_else(|| self.provided(ProfileField::Phone))
    }

    /// Contact number for the profile view: phone first, emergency contact second.
    pub fn display_contact(&self) -> &str {
        self.provided(ProfileField::Phone)
            .or_else(|| self.provided(ProfileField::EmergencyContact))
            .unwrap_or(NOT_PROVIDED)
    }

    /// Required issuance fields that are missing or blank, empty when the
    /// profile is ready for issuance.
    pub fn missing_issuance_fields(&self) -> Vec<RequiredField> {
        let mut missing = Vec::new();
        if self.provided(ProfileField::FullName).is_none() {
            missing.push(RequiredField::FullName);
        }
        if self.provided(ProfileField::Nationality).is_none() {
            missing.push(RequiredField::Nationality);
        }
        if self.issuance_contact().is_none() {
            missing.push(RequiredField::Contact);
        }
        missing
    }

    /// Merge a partial update into this profile.
    ///
    /// The update is checked before anything is written, so a rejected
    /// merge leaves the profile untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileMergeError::CredentialAlreadyRecorded`] if the update
    /// carries a credential and this profile already has one.
    pub fn apply(&mut self, update: ProfileUpdate) -> Result<(), ProfileMergeError> {
        if let (Some(existing), Some(_)) = (&self.credential, &update.issued_credential) {
            return Err(ProfileMergeError::CredentialAlreadyRecorded {
                existing_vc_id: existing.vc_id.clone(),
            });
        }

        let ProfileUpdate {
            full_name,
            nationality,
            phone,
            emergency_contact,
            address,
            date_of_birth,
            identity_verified_at,
            info_captured,
            issued_credential,
        } = update;

        merge_field(&mut self.full_name, full_name);
        merge_field(&mut self.nationality, nationality);
        merge_field(&mut self.phone, phone);
        merge_field(&mut self.emergency_contact, emergency_contact);
        merge_field(&mut self.address, address);
        merge_field(&mut self.date_of_birth, date_of_birth);

        if let Some(at) = identity_verified_at {
            if !self.identity_verified {
                self.identity_verified = true;
                self.identity_verified_at = Some(at);
            }
        }
        if info_captured {
            self.info_captured = true;
        }
        if let Some(IssuedCredential { issued_at, bundle }) = issued_credential {
            self.credential_issued = true;
            self.credential_issued_at = Some(issued_at);
            self.credential = Some(bundle);
        }
        Ok(())
    }
}

fn merge_field(slot: &mut Option<String>, value: Option<String>) {
    if let Some(v) = value {
        *slot = Some(v);
    }
}

/// A credential recorded together with its issuance time.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedCredential {
    /// When the portal recorded the issuance.
    pub issued_at: DateTime<Utc>,
    /// The artifacts returned by the issuer.
    pub bundle: CredentialBundle,
}

/// A partial-field merge for a [`UserProfile`].
///
/// `None` (or `false`) leaves the stored value untouched. Status flags can
/// only be raised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    /// New full name.
    pub full_name: Option<String>,
    /// New nationality.
    pub nationality: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
    /// New emergency contact.
    pub emergency_contact: Option<String>,
    /// New address.
    pub address: Option<String>,
    /// New date of birth.
    pub date_of_birth: Option<String>,
    /// Raise `identityVerified`, stamping the given time if not yet verified.
    pub identity_verified_at: Option<DateTime<Utc>>,
    /// Raise `infoCaptured`.
    pub info_captured: bool,
    /// Record an issued credential and raise `credentialIssued`.
    pub issued_credential: Option<IssuedCredential>,
}

impl ProfileUpdate {
    /// Update recording an issued credential.
    pub fn credential_issued(issued_at: DateTime<Utc>, bundle: CredentialBundle) -> Self {
        Self {
            issued_credential: Some(IssuedCredential { issued_at, bundle }),
            ..Self::default()
        }
    }

    /// Update raising `identityVerified`.
    pub fn identity_verified(at: DateTime<Utc>) -> Self {
        Self {
            identity_verified_at: Some(at),
            ..Self::default()
        }
    }

    /// Update raising `infoCaptured`.
    pub fn info_captured() -> Self {
        Self {
            info_captured: true,
            ..Self::default()
        }
    }

    /// Set one identity field.
    pub fn with_field(mut self, field: ProfileField, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match field {
            ProfileField::FullName => self.full_name = value,
            ProfileField::Nationality => self.nationality = value,
            ProfileField::Phone => self.phone = value,
            ProfileField::EmergencyContact => self.emergency_contact = value,
            ProfileField::Address => self.address = value,
            ProfileField::DateOfBirth => self.date_of_birth = value,
        }
        self
    }

    /// Document keys this update writes.
    pub fn changed_keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = ProfileField::ALL
            .iter()
            .filter(|f| self.identity_value(**f).is_some())
            .map(ProfileField::document_key)
            .collect();
        if self.identity_verified_at.is_some() {
            keys.extend(["didCreated", "didCreatedAt"]);
        }
        if self.info_captured {
            keys.push("touristInfoCaptured");
        }
        if self.issued_credential.is_some() {
            keys.extend(["vcIssued", "vcIssuedAt"]);
            keys.extend(CredentialBundle::ARTIFACT_KEYS);
            keys.push("vcData");
        }
        keys
    }

    /// Whether the update writes nothing.
    pub fn is_empty(&self) -> bool {
        self.changed_keys().is_empty()
    }

    fn identity_value(&self, field: ProfileField) -> Option<&String> {
        match field {
            ProfileField::FullName => self.full_name.as_ref(),
            ProfileField::Nationality => self.nationality.as_ref(),
            ProfileField::Phone => self.phone.as_ref(),
            ProfileField::EmergencyContact => self.emergency_contact.as_ref(),
            ProfileField::Address => self.address.as_ref(),
            ProfileField::DateOfBirth => self.date_of_birth.as_ref(),
        }
    }
}
