//! # Profile Repository
//!
//! Read and partial-merge access to the per-user profile document.

use std::future::Future;

use samriddhi_core::{ProfileUpdate, UserId, UserProfile};

use crate::error::StoreError;
use crate::memory::InMemoryProfileRepository;
use crate::postgres::PgProfileRepository;

/// Storage for profile documents, keyed by [`UserId`].
///
/// Implementations must be `Send + Sync` so they can be shared across
/// async tasks behind an `Arc`.
pub trait ProfileRepository: Send + Sync {
    /// Fetch a profile. `None` if the user has no document yet.
    fn get(
        &self,
        user: &UserId,
    ) -> impl Future<Output = Result<Option<UserProfile>, StoreError>> + Send;

    /// Merge a partial update into the user's document, creating it if
    /// absent, and return the document as stored.
    ///
    /// A rejected merge writes nothing.
    fn merge(
        &self,
        user: &UserId,
        update: ProfileUpdate,
    ) -> impl Future<Output = Result<UserProfile, StoreError>> + Send;
}

/// Runtime choice of profile backend.
///
/// The API binary picks Postgres when `DATABASE_URL` is set and falls back
/// to memory otherwise.
#[derive(Debug, Clone)]
pub enum ProfileBackend {
    /// Process-local documents.
    Memory(InMemoryProfileRepository),
    /// PostgreSQL JSONB documents.
    Postgres(PgProfileRepository),
}

impl ProfileBackend {
    /// Short backend name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgres(_) => "postgres",
        }
    }
}

impl ProfileRepository for ProfileBackend {
    async fn get(&self, user: &UserId) -> Result<Option<UserProfile>, StoreError> {
        match self {
            Self::Memory(repo) => repo.get(user).await,
            Self::Postgres(repo) => repo.get(user).await,
        }
    }

    async fn merge(&self, user: &UserId, update: ProfileUpdate) -> Result<UserProfile, StoreError> {
        match self {
            Self::Memory(repo) => repo.merge(user, update).await,
            Self::Postgres(repo) => repo.merge(user, update).await,
        }
    }
}
