/// Session registry rows
///
/// One row per active refresh-token grant. A session is valid while
/// `now < expires_at` and the row exists; deleting the row is how a
/// session is revoked.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sessions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     refresh_token TEXT NOT NULL,
///     expires_at TIMESTAMPTZ NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const SESSION_COLUMNS: &str = "id, user_id, refresh_token, expires_at, created_at, updated_at";

/// A persisted refresh-token grant
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// The exact refresh token string currently valid for this session
    pub refresh_token: String,

    /// Session expiry, independent of the token's own `exp`
    pub expires_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Strict expiry check: a session expiring exactly at `now` is expired
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Checks expiry against the current wall clock
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Input for creating a session row
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub user_id: Uuid,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Inserts a new session (never replaces existing ones)
    pub async fn create(pool: &PgPool, data: CreateSession) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (user_id, refresh_token, expires_at) \
             VALUES ($1, $2, $3) RETURNING {}",
            SESSION_COLUMNS
        );

        sqlx::query_as::<_, Session>(&query)
            .bind(data.user_id)
            .bind(data.refresh_token)
            .bind(data.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Most recently created session of a user
    pub async fn latest_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM sessions WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT 1",
            SESSION_COLUMNS
        );

        sqlx::query_as::<_, Session>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Session matching both the user and the exact refresh token
    pub async fn find_by_user_and_token(
        pool: &PgPool,
        user_id: Uuid,
        refresh_token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM sessions WHERE user_id = $1 AND refresh_token = $2 LIMIT 1",
            SESSION_COLUMNS
        );

        sqlx::query_as::<_, Session>(&query)
            .bind(user_id)
            .bind(refresh_token)
            .fetch_optional(pool)
            .await
    }

    /// Replaces the refresh token and expiry of an existing row in place
    ///
    /// The update is conditional on the row still holding `current_token`,
    /// so of two concurrent refreshes with the same token only one wins.
    /// Returns `None` if the row was deleted or already rotated.
    pub async fn rotate(
        pool: &PgPool,
        id: Uuid,
        current_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE sessions SET refresh_token = $3, expires_at = $4, updated_at = NOW() \
             WHERE id = $1 AND refresh_token = $2 RETURNING {}",
            SESSION_COLUMNS
        );

        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .bind(current_token)
            .bind(refresh_token)
            .bind(expires_at)
            .fetch_optional(pool)
            .await
    }

    /// Deletes every session of a user, returning how many rows went away
    pub async fn delete_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
