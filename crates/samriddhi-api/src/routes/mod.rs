//! # API Route Modules
//!
//! - `dashboard`: Overview, tab selection, and action card invocation
//!   (e-KYC, credential issuance, navigation).
//! - `profile`: Profile tab and identity field edits.
//! - `relief`: Case relief form draft and submission (info capture).
//! - `session`: Sign-out.

pub mod dashboard;
pub mod profile;
pub mod relief;
pub mod session;
