#![deny(missing_docs)]

//! # samriddhi-core: Foundational Types for the SAMRIDDHI Portal
//!
//! Every other crate in the workspace depends on this one. It has no
//! internal crate dependencies and no I/O.
//!
//! ## Design Principles
//!
//! 1. **Typed identifiers.** A [`UserId`] is validated once at the edge and
//!    carried as a distinct type afterwards.
//!
//! 2. **The profile document owns its merge rules.** [`UserProfile::apply`]
//!    is the only way a [`ProfileUpdate`] lands on a profile, so the
//!    monotonic status flags and the write-once credential bundle hold for
//!    every storage backend.
//!
//! 3. **Structured errors with `thiserror`.** No `Box<dyn Error>`, no
//!    `.unwrap()` outside tests.

pub mod credential;
pub mod error;
pub mod identity;
pub mod profile;
pub mod relief;

pub use credential::{AccessToken, CredentialBundle};
pub use error::{ProfileMergeError, ValidationError};
pub use identity::UserId;
pub use profile::{
    IssuedCredential, ProfileField, ProfileUpdate, RequiredField, UserProfile, NOT_PROVIDED,
};
pub use relief::{AtrocityType, BankSeedingStatus, CaseReliefRecord, ReliefField, ReliefStage};
