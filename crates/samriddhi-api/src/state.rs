//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! - **Workflow**: the credential workflow over the configured profile
//!   backend and the issuance client.
//! - **Auth**: the session service that resolves bearer tokens, either
//!   the hosted service or an in-memory table for development.
//! - **Views**: one open dashboard view per signed-in user, holding the
//!   active tab, cached profile and relief form draft.
//! - **Relief inbox**: a bounded queue where submitted relief records wait
//!   for the downstream sanction process to drain them.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use samriddhi_core::{CaseReliefRecord, UserId};
use samriddhi_dashboard::{CredentialWorkflow, Dashboard, FormError, ReliefSink};
use samriddhi_issuance_client::{ConfigError, IssuanceClient, IssuanceConfig};
use samriddhi_store::{
    AuthBackend, AuthConfigError, HostedAuthConfig, HostedAuthService, InMemoryAuthService,
    InMemoryProfileRepository, ProfileBackend, SessionToken,
};

/// The workflow type the service runs.
pub type PortalWorkflow = CredentialWorkflow<ProfileBackend, IssuanceClient>;

/// One user's dashboard view.
pub type PortalDashboard = Dashboard<ProfileBackend, IssuanceClient>;

// -- Configuration ------------------------------------------------------------

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parse `LOG_FORMAT`. Anything other than `json` is text.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// A session seeded into the in-memory auth service so a developer can
/// call the API without the hosted authentication service.
#[derive(Debug, Clone)]
pub struct DevSession {
    /// Session owner.
    pub user_id: UserId,
    /// Sign-in email shown on the profile tab.
    pub email: Option<String>,
    /// Bearer token the developer will present.
    pub token: SessionToken,
}

impl DevSession {
    /// Build from the raw `DEV_SESSION_*` values. `None` when no user is
    /// named.
    ///
    /// # Errors
    ///
    /// [`AppConfigError::DevSession`] for a blank token or an invalid user id.
    pub fn from_vars(
        user: Option<String>,
        token: Option<String>,
        email: Option<String>,
    ) -> Result<Option<Self>, AppConfigError> {
        let Some(user) = user.filter(|u| !u.trim().is_empty()) else {
            return Ok(None);
        };
        let user_id =
            UserId::new(user).map_err(|e| AppConfigError::DevSession(e.to_string()))?;
        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppConfigError::DevSession("DEV_SESSION_TOKEN is required".into()))?;
        Ok(Some(Self {
            user_id,
            email: email.filter(|e| !e.trim().is_empty()),
            token: SessionToken::new(token),
        }))
    }
}

/// Application configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum AppConfigError {
    #[error(transparent)]
    Issuance(#[from] ConfigError),
    #[error(transparent)]
    Auth(#[from] AuthConfigError),
    #[error("invalid development session: {0}")]
    DevSession(String),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Log output format.
    pub log_format: LogFormat,
    /// Issuance endpoint configuration.
    pub issuance: IssuanceConfig,
    /// Hosted authentication service. In-memory sessions when `None`.
    pub hosted_auth: Option<HostedAuthConfig>,
    /// Development session for the in-memory auth service.
    pub dev_session: Option<DevSession>,
    /// Most relief records held before the oldest are dropped.
    pub relief_capacity: usize,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PORT` (default: 8080)
    /// - `LOG_FORMAT` (`json` or text, default: text)
    /// - `RELIEF_INBOX_CAPACITY` (default: 1000)
    /// - `DEV_SESSION_USER`, `DEV_SESSION_TOKEN`, `DEV_SESSION_EMAIL`
    ///   (development only; ignored when hosted auth is configured)
    /// - everything [`IssuanceConfig::from_env`] and
    ///   [`HostedAuthConfig::from_env`] read
    ///
    /// `DATABASE_URL` is read separately by
    /// [`samriddhi_store::init_pool`].
    pub fn from_env() -> Result<Self, AppConfigError> {
        let var = |name: &str| std::env::var(name).ok();
        Ok(Self {
            port: var("PORT").and_then(|p| p.parse().ok()).unwrap_or(8080),
            log_format: var("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
            issuance: IssuanceConfig::from_env()?,
            hosted_auth: HostedAuthConfig::from_env()?,
            dev_session: DevSession::from_vars(
                var("DEV_SESSION_USER"),
                var("DEV_SESSION_TOKEN"),
                var("DEV_SESSION_EMAIL"),
            )?,
            relief_capacity: var("RELIEF_INBOX_CAPACITY")
                .and_then(|c| c.parse().ok())
                .unwrap_or(ReliefInbox::DEFAULT_CAPACITY),
        })
    }

    /// The session service this configuration selects.
    ///
    /// # Errors
    ///
    /// [`AuthConfigError`] if the hosted client cannot be built.
    pub fn auth_backend(&self) -> Result<AuthBackend, AuthConfigError> {
        if let Some(hosted) = &self.hosted_auth {
            if self.dev_session.is_some() {
                tracing::warn!("DEV_SESSION_USER ignored: hosted authentication is configured");
            }
            return Ok(AuthBackend::Hosted(HostedAuthService::new(hosted.clone())?));
        }

        let memory = InMemoryAuthService::new();
        match &self.dev_session {
            Some(dev) => {
                memory.insert_session(dev.token.clone(), dev.user_id.clone(), dev.email.clone());
                tracing::warn!(user_id = %dev.user_id, "development session seeded; do not use in production");
            }
            None => tracing::warn!(
                "AUTH_BASE_URL is not set and no development session is seeded; every request will be unauthorized"
            ),
        }
        Ok(AuthBackend::Memory(memory))
    }
}

// -- Dashboard views ----------------------------------------------------------

/// Open dashboard views keyed by user.
///
/// The `RwLock` is `parking_lot` and is never held across `.await`; views
/// are handed out as `Arc`s and do their own locking.
#[derive(Debug, Clone, Default)]
pub struct ViewStore {
    views: Arc<RwLock<HashMap<UserId, Arc<PortalDashboard>>>>,
}

impl ViewStore {
    /// The user's open view, opening one if none exists.
    pub fn open_or_get(&self, workflow: &PortalWorkflow, user: &UserId) -> Arc<PortalDashboard> {
        if let Some(view) = self.views.read().get(user) {
            return Arc::clone(view);
        }
        let mut views = self.views.write();
        Arc::clone(views.entry(user.clone()).or_insert_with(|| {
            tracing::debug!(user_id = %user, "dashboard view opened");
            Arc::new(Dashboard::open(workflow.clone(), user.clone()))
        }))
    }

    /// Close and forget the user's view. Late results for it are dropped.
    pub fn close(&self, user: &UserId) -> bool {
        match self.views.write().remove(user) {
            Some(view) => {
                view.close();
                true
            }
            None => false,
        }
    }

    /// Number of open views.
    pub fn len(&self) -> usize {
        self.views.read().len()
    }

    /// Whether no views are open.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// -- Relief inbox -------------------------------------------------------------

/// A relief record accepted from a user.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedRelief {
    /// Submitting user.
    pub user_id: UserId,
    /// The record as submitted.
    pub record: CaseReliefRecord,
    /// Acceptance time.
    pub received_at: DateTime<Utc>,
}

/// In-process hand-off point for submitted relief records.
///
/// Holds at most `capacity` records. When full, the oldest is dropped
/// with a warning so an absent consumer cannot grow the process without
/// bound.
#[derive(Debug, Clone)]
pub struct ReliefInbox {
    records: Arc<RwLock<VecDeque<SubmittedRelief>>>,
    capacity: usize,
}

impl Default for ReliefInbox {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl ReliefInbox {
    /// Capacity when none is configured.
    pub const DEFAULT_CAPACITY: usize = 1000;

    /// An empty inbox holding at most `capacity` records (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Arc::default(),
            capacity: capacity.max(1),
        }
    }

    /// Records waiting, oldest first.
    pub fn records(&self) -> Vec<SubmittedRelief> {
        self.records.read().iter().cloned().collect()
    }

    /// Number of records waiting.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether no records are waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every waiting record, oldest first.
    pub fn drain(&self) -> Vec<SubmittedRelief> {
        let drained: Vec<_> = self.records.write().drain(..).collect();
        if !drained.is_empty() {
            tracing::info!(count = drained.len(), "relief records drained");
        }
        drained
    }

    /// A sink that files records under `user`.
    pub fn for_user<'a>(&'a self, user: &'a UserId) -> UserReliefSink<'a> {
        UserReliefSink { inbox: self, user }
    }

    fn push(&self, entry: SubmittedRelief) {
        let mut records = self.records.write();
        if records.len() >= self.capacity {
            if let Some(dropped) = records.pop_front() {
                tracing::warn!(
                    user_id = %dropped.user_id,
                    received_at = %dropped.received_at,
                    capacity = self.capacity,
                    "relief inbox full; oldest record dropped"
                );
            }
        }
        records.push_back(entry);
    }
}

/// [`ReliefSink`] for one user's submissions.
#[derive(Debug)]
pub struct UserReliefSink<'a> {
    inbox: &'a ReliefInbox,
    user: &'a UserId,
}

impl ReliefSink for UserReliefSink<'_> {
    async fn submit(&self, record: &CaseReliefRecord) -> Result<(), FormError> {
        self.inbox.push(SubmittedRelief {
            user_id: self.user.clone(),
            record: record.clone(),
            received_at: Utc::now(),
        });
        tracing::info!(user_id = %self.user, "relief record handed off");
        Ok(())
    }
}

// -- AppState -----------------------------------------------------------------

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Credential workflow over the profile backend.
    pub workflow: PortalWorkflow,
    /// Session service.
    pub auth: Arc<AuthBackend>,
    /// Open dashboard views.
    pub views: ViewStore,
    /// Submitted relief records.
    pub relief: ReliefInbox,
}

impl AppState {
    /// Assemble state from its collaborators.
    pub fn new(profiles: ProfileBackend, issuer: IssuanceClient, auth: AuthBackend) -> Self {
        Self {
            workflow: CredentialWorkflow::new(Arc::new(profiles), Arc::new(issuer)),
            auth: Arc::new(auth),
            views: ViewStore::default(),
            relief: ReliefInbox::default(),
        }
    }

    /// In-memory profiles and sessions, issuing against `issuance`.
    pub fn in_memory(issuance: IssuanceConfig) -> Result<Self, samriddhi_issuance_client::IssuanceApiError> {
        Ok(Self::new(
            ProfileBackend::Memory(InMemoryProfileRepository::new()),
            IssuanceClient::new(issuance)?,
            AuthBackend::Memory(InMemoryAuthService::new()),
        ))
    }

    /// Replace the relief inbox.
    pub fn with_relief_inbox(mut self, relief: ReliefInbox) -> Self {
        self.relief = relief;
        self
    }

    /// The user's open dashboard view.
    pub fn view(&self, user: &UserId) -> Arc<PortalDashboard> {
        self.views.open_or_get(&self.workflow, user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use samriddhi_store::AuthService;

    fn state() -> AppState {
        AppState::in_memory(IssuanceConfig::local_mock("http://127.0.0.1:3000").unwrap()).unwrap()
    }

    #[test]
    fn log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Text);
    }

    #[test]
    fn view_is_reused_until_closed() {
        let state = state();
        let user = UserId::new("u1").unwrap();
        let a = state.view(&user);
        let b = state.view(&user);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(state.views.len(), 1);

        assert!(state.views.close(&user));
        assert!(a.scope().is_closed());
        assert!(state.views.is_empty());
        assert!(!state.views.close(&user));

        let c = state.view(&user);
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[tokio::test]
    async fn inbox_files_records_under_user() {
        let inbox = ReliefInbox::default();
        let user = UserId::new("u1").unwrap();
        inbox
            .for_user(&user)
            .submit(&CaseReliefRecord::new())
            .await
            .unwrap();
        let records = inbox.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_id, user);
    }

    #[tokio::test]
    async fn full_inbox_drops_oldest_and_drain_empties_it() {
        let inbox = ReliefInbox::with_capacity(2);
        for (name, fir) in [("u1", "1/2024"), ("u2", "2/2024"), ("u3", "3/2024")] {
            let user = UserId::new(name).unwrap();
            let mut record = CaseReliefRecord::new();
            record.fir_number = fir.into();
            inbox.for_user(&user).submit(&record).await.unwrap();
        }
        assert_eq!(inbox.len(), 2);

        let drained = inbox.drain();
        let firs: Vec<_> = drained.iter().map(|r| r.record.fir_number.as_str()).collect();
        assert_eq!(firs, ["2/2024", "3/2024"]);
        assert!(inbox.is_empty());
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn zero_capacity_still_holds_one_record() {
        assert_eq!(ReliefInbox::with_capacity(0).capacity, 1);
    }

    #[test]
    fn dev_session_needs_user_and_token() {
        assert!(DevSession::from_vars(None, Some("t".into()), None).unwrap().is_none());
        assert!(DevSession::from_vars(Some("  ".into()), None, None).unwrap().is_none());
        assert!(matches!(
            DevSession::from_vars(Some("uid-1".into()), None, None),
            Err(AppConfigError::DevSession(_))
        ));

        let dev = DevSession::from_vars(Some("uid-1".into()), Some("tok".into()), Some(String::new()))
            .unwrap()
            .unwrap();
        assert_eq!(dev.user_id.as_str(), "uid-1");
        assert_eq!(dev.email, None);
        assert!(format!("{dev:?}").contains("[REDACTED]"));
    }

    fn config(hosted: Option<HostedAuthConfig>, dev: Option<DevSession>) -> AppConfig {
        AppConfig {
            port: 0,
            log_format: LogFormat::Text,
            issuance: IssuanceConfig::local_mock("http://127.0.0.1:3000").unwrap(),
            hosted_auth: hosted,
            dev_session: dev,
            relief_capacity: ReliefInbox::DEFAULT_CAPACITY,
        }
    }

    #[tokio::test]
    async fn memory_backend_serves_the_dev_session() {
        let dev = DevSession::from_vars(Some("uid-1".into()), Some("dev-tok".into()), None)
            .unwrap();
        let auth = config(None, dev).auth_backend().unwrap();
        assert_eq!(auth.name(), "memory");
        assert_eq!(auth.authenticate("dev-tok").await.unwrap().user_id.as_str(), "uid-1");
    }

    #[test]
    fn hosted_config_selects_hosted_backend() {
        let hosted = HostedAuthConfig::new("https://auth.example.in").unwrap();
        let dev = DevSession::from_vars(Some("uid-1".into()), Some("dev-tok".into()), None)
            .unwrap();
        let auth = config(Some(hosted), dev).auth_backend().unwrap();
        assert_eq!(auth.name(), "hosted");
        assert!(auth.memory().is_none());
    }
}
