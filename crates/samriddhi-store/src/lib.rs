//! # samriddhi-store: Profile Storage and Sessions
//!
//! The portal talks to two hosted services it does not own: a document
//! database holding one profile per user, and an authentication service.
//! This crate puts both behind traits so the workflow and dashboard logic
//! can run against in-memory doubles in tests.
//!
//! | Trait | Backends |
//! |-------|----------|
//! | [`ProfileRepository`] | [`InMemoryProfileRepository`], [`PgProfileRepository`], [`ProfileBackend`] (runtime choice) |
//! | [`AuthService`] | [`InMemoryAuthService`], [`HostedAuthService`], [`AuthBackend`] (runtime choice) |
//!
//! Every backend merges updates through [`samriddhi_core::UserProfile::apply`],
//! so the monotonic flags and the write-once credential bundle hold no
//! matter where the document lives.

pub mod auth;
pub mod error;
pub mod hosted_auth;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use auth::{AuthBackend, AuthService, InMemoryAuthService, Session, SessionToken};
pub use error::{AuthError, StoreError};
pub use hosted_auth::{AuthConfigError, HostedAuthConfig, HostedAuthService};
pub use memory::InMemoryProfileRepository;
pub use postgres::{init_pool, PgProfileRepository};
pub use repository::{ProfileBackend, ProfileRepository};
