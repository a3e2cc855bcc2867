//! # samriddhi-dashboard: Portal Dashboard Logic
//!
//! Everything the dashboard does between a click and the profile store:
//!
//! - [`CredentialWorkflow`]: validate the profile, call the issuer, record
//!   the credential bundle. Also the e-KYC and info-capture merges.
//! - [`DashboardState`]: the tab selector, status indicators and gated
//!   action cards, as pure data.
//! - [`VerificationForm`]: the case relief form and its submission guard.
//! - [`ViewScope`]: cancellation tied to the lifetime of an open view.
//! - [`Dashboard`]: one open view, tying the above together.
//!
//! External services arrive as trait implementations
//! ([`samriddhi_store::ProfileRepository`],
//! [`samriddhi_issuance_client::CredentialIssuer`], [`ReliefSink`]), so every
//! path here runs in tests against in-memory doubles.

pub mod dashboard;
pub mod error;
pub mod form;
pub mod scope;
pub mod view;
pub mod workflow;

pub use dashboard::{ActionOutcome, Dashboard};
pub use error::{DashboardError, ErrorClass, FormError, IssuanceError};
pub use form::{ReliefSink, SubmitGuard, VerificationForm};
pub use scope::{Cancelled, ViewScope};
pub use view::{
    ActionCard, ActionEffect, ActionKind, ActionSection, DashboardState, DashboardTab, NavItem,
    ProfileRow, StatusIndicator, Tone, NAV_ITEMS,
};
pub use workflow::{CredentialWorkflow, IssuanceOutcome};
