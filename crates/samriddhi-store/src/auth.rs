//! # Session Authentication
//!
//! The portal never sees passwords. A hosted authentication service
//! issues session tokens; the portal asks it which user a token belongs
//! to and tells it when the user signs out.
//!
//! [`InMemoryAuthService`] stands in for that service in development and
//! tests. Tokens are random v4 UUIDs. [`HostedAuthService`] talks to the
//! real one, and [`AuthBackend`] picks between them at startup.
//!
//! Tokens are held as [`SessionToken`] everywhere, including the keys of
//! the in-memory session table, so they are zeroed when dropped and never
//! printed by `Debug`.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::RwLock;
use samriddhi_core::UserId;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::error::AuthError;
use crate::hosted_auth::HostedAuthService;

/// Opaque bearer token for a signed-in session. Zeroed on drop and
/// redacted from `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(Zeroizing<String>);

impl SessionToken {
    /// Wrap a raw token string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// The raw token, for placing in an `Authorization` header.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl Hash for SessionToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.expose().hash(state);
    }
}

// Lets the session table be probed with the raw header value without
// copying it into an unzeroed `String`.
impl Borrow<str> for SessionToken {
    fn borrow(&self) -> &str {
        self.expose()
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

/// The user behind a valid session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Stable user identifier; keys the profile document.
    pub user_id: UserId,
    /// Sign-in email, shown on the profile tab.
    pub email: Option<String>,
}

/// Hosted authentication service.
pub trait AuthService: Send + Sync {
    /// Resolve a bearer token to its session.
    fn authenticate(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Session, AuthError>> + Send;

    /// End the session. Signing out an unknown token is not an error.
    fn sign_out(&self, token: &str) -> impl Future<Output = Result<(), AuthError>> + Send;
}

/// Process-local session table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuthService {
    sessions: Arc<RwLock<HashMap<SessionToken, Session>>>,
}

impl InMemoryAuthService {
    /// Create an empty session table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session for `user_id` and return its token.
    pub fn create_session(&self, user_id: UserId, email: Option<String>) -> SessionToken {
        let token = SessionToken::new(Uuid::new_v4().simple().to_string());
        self.insert_session(token.clone(), user_id, email);
        token
    }

    /// Register a session under a caller-chosen token, replacing any
    /// session already holding it.
    pub fn insert_session(&self, token: SessionToken, user_id: UserId, email: Option<String>) {
        self.sessions.write().insert(token, Session { user_id, email });
    }

    /// Number of live sessions.
    pub fn active_sessions(&self) -> usize {
        self.sessions.read().len()
    }
}

impl AuthService for InMemoryAuthService {
    async fn authenticate(&self, token: &str) -> Result<Session, AuthError> {
        self.sessions
            .read()
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidSession)
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        if let Some(session) = self.sessions.write().remove(token) {
            tracing::info!(user_id = %session.user_id, "session ended");
        }
        Ok(())
    }
}

/// The session service chosen at startup.
#[derive(Debug, Clone)]
pub enum AuthBackend {
    /// Process-local sessions.
    Memory(InMemoryAuthService),
    /// The hosted authentication service.
    Hosted(HostedAuthService),
}

impl AuthBackend {
    /// Short backend name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Hosted(_) => "hosted",
        }
    }

    /// The in-memory session table, when that is the backend.
    pub fn memory(&self) -> Option<&InMemoryAuthService> {
        match self {
            Self::Memory(auth) => Some(auth),
            Self::Hosted(_) => None,
        }
    }
}

impl AuthService for AuthBackend {
    async fn authenticate(&self, token: &str) -> Result<Session, AuthError> {
        match self {
            Self::Memory(auth) => auth.authenticate(token).await,
            Self::Hosted(auth) => auth.authenticate(token).await,
        }
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        match self {
            Self::Memory(auth) => auth.sign_out(token).await,
            Self::Hosted(auth) => auth.sign_out(token).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    #[tokio::test]
    async fn created_session_authenticates() {
        let auth = InMemoryAuthService::new();
        let token = auth.create_session(uid("u1"), Some("a@example.in".into()));
        let session = auth.authenticate(token.expose()).await.unwrap();
        assert_eq!(session.user_id, uid("u1"));
        assert_eq!(session.email.as_deref(), Some("a@example.in"));
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let auth = InMemoryAuthService::new();
        assert_eq!(
            auth.authenticate("nope").await,
            Err(AuthError::InvalidSession)
        );
    }

    #[tokio::test]
    async fn sign_out_invalidates_token() {
        let auth = InMemoryAuthService::new();
        let token = auth.create_session(uid("u1"), None);
        auth.sign_out(token.expose()).await.unwrap();
        assert_eq!(
            auth.authenticate(token.expose()).await,
            Err(AuthError::InvalidSession)
        );
        assert_eq!(auth.active_sessions(), 0);
        // second sign-out is a no-op
        auth.sign_out(token.expose()).await.unwrap();
    }

    #[test]
    fn tokens_are_unique_and_redacted() {
        let auth = InMemoryAuthService::new();
        let a = auth.create_session(uid("u1"), None);
        let b = auth.create_session(uid("u1"), None);
        assert_ne!(a, b);
        assert_eq!(format!("{a:?}"), "SessionToken([REDACTED])");
    }

    #[test]
    fn session_table_never_prints_tokens() {
        let auth = InMemoryAuthService::new();
        let token = auth.create_session(uid("u1"), Some("a@example.in".into()));
        let printed = format!("{auth:?}");
        assert!(!printed.contains(token.expose()));
        assert!(printed.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn inserted_token_authenticates_by_raw_value() {
        let auth = AuthBackend::Memory(InMemoryAuthService::new());
        auth.memory()
            .unwrap()
            .insert_session(SessionToken::new("dev-token"), uid("u9"), None);
        assert_eq!(auth.authenticate("dev-token").await.unwrap().user_id, uid("u9"));
        assert_eq!(auth.name(), "memory");

        auth.sign_out("dev-token").await.unwrap();
        assert_eq!(
            auth.authenticate("dev-token").await,
            Err(AuthError::InvalidSession)
        );
    }
}
