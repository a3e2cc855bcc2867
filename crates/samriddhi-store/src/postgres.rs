//! # PostgreSQL Profile Backend
//!
//! Optional persistence for profile documents. When `DATABASE_URL` is set
//! the API stores each profile as a JSONB document in `user_profiles`;
//! when absent it runs against [`crate::InMemoryProfileRepository`] and
//! state does not survive restarts.
//!
//! Merges are read-modify-write inside a transaction that holds the row
//! lock, so two concurrent issuances for the same user cannot both record
//! a credential bundle.

use samriddhi_core::{ProfileUpdate, UserId, UserProfile};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::StoreError;
use crate::repository::ProfileRepository;

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            tracing::warn!(
                "DATABASE_URL not set, profiles are held in memory and will not survive restarts"
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;
    tracing::info!("connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("profile store migrations applied");

    Ok(Some(pool))
}

/// Profile documents in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgProfileRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    document: serde_json::Value,
}

impl PgProfileRepository {
    /// Wrap an initialized pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl ProfileRepository for PgProfileRepository {
    async fn get(&self, user: &UserId) -> Result<Option<UserProfile>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT document FROM user_profiles WHERE user_id = $1",
        )
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| serde_json::from_value(r.document))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn merge(&self, user: &UserId, update: ProfileUpdate) -> Result<UserProfile, StoreError> {
        let keys = update.changed_keys();
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT document FROM user_profiles WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let mut profile: UserProfile = match row {
            Some(r) => serde_json::from_value(r.document)?,
            None => UserProfile::new(),
        };
        // Dropping `tx` on the error path rolls back.
        profile.apply(update)?;
        let document = serde_json::to_value(&profile)?;

        sqlx::query(
            "INSERT INTO user_profiles (user_id, document, updated_at) \
             VALUES ($1, $2, now()) \
             ON CONFLICT (user_id) DO UPDATE \
             SET document = EXCLUDED.document, updated_at = now()",
        )
        .bind(user.as_str())
        .bind(&document)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(user_id = %user, ?keys, "profile merged");
        Ok(profile)
    }
}
