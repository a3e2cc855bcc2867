//! # Identity Newtypes
//!
//! The authentication service hands out an opaque uid per account. Profiles,
//! sessions and issuance requests are all keyed by it.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Identifier of an authenticated portal user.
///
/// Opaque: the only constraint is that it is non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Create a user identifier, rejecting blank input.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyUserId`] if the value is empty or
    /// whitespace only.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyUserId);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_trims_whitespace() {
        let id = UserId::new("  uid-42 ").unwrap();
        assert_eq!(id.as_str(), "uid-42");
    }

    #[test]
    fn user_id_rejects_blank() {
        assert_eq!(UserId::new(""), Err(ValidationError::EmptyUserId));
        assert_eq!(UserId::new("   "), Err(ValidationError::EmptyUserId));
    }

    #[test]
    fn user_id_deserialize_validates() {
        let ok: UserId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(ok.to_string(), "abc");
        assert!(serde_json::from_str::<UserId>("\"\"").is_err());
    }
}
