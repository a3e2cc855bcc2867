//! In-memory profile backend.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use samriddhi_core::{ProfileUpdate, UserId, UserProfile};

use crate::error::StoreError;
use crate::repository::ProfileRepository;

/// Thread-safe, cloneable in-memory profile store.
///
/// The `RwLock` is `parking_lot`, never held across `.await`, and
/// non-poisoning: a panicking writer does not corrupt the store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfileRepository {
    data: Arc<RwLock<HashMap<UserId, UserProfile>>>,
}

impl InMemoryProfileRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a user's document wholesale. Seeding helper for tests and
    /// local development.
    pub fn insert(&self, user: UserId, profile: UserProfile) -> Option<UserProfile> {
        self.data.write().insert(user, profile)
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn merge_sync(&self, user: &UserId, update: ProfileUpdate) -> Result<UserProfile, StoreError> {
        let mut guard = self.data.write();
        let mut next = guard.get(user).cloned().unwrap_or_default();
        next.apply(update)?;
        guard.insert(user.clone(), next.clone());
        Ok(next)
    }
}

impl ProfileRepository for InMemoryProfileRepository {
    async fn get(&self, user: &UserId) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.data.read().get(user).cloned())
    }

    async fn merge(&self, user: &UserId, update: ProfileUpdate) -> Result<UserProfile, StoreError> {
        let keys = update.changed_keys();
        let merged = self.merge_sync(user, update)?;
        tracing::debug!(user_id = %user, ?keys, "profile merged");
        Ok(merged)
    }
}
