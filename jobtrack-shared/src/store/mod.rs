/// Credential store: the `users` and `sessions` tables behind a trait
///
/// Everything the session lifecycle and the account endpoints need from
/// persistence goes through [`CredentialStore`]. Two implementations ship:
///
/// - [`postgres::PgCredentialStore`]: sqlx/PostgreSQL, used in production
/// - [`memory::MemoryCredentialStore`]: in-process, used by tests and for
///   running the API without a database
///
/// # Example
///
/// ```
/// use jobtrack_shared::models::user::CreateUser;
/// use jobtrack_shared::store::{memory::MemoryCredentialStore, CredentialStore};
///
/// # async fn example() -> Result<(), jobtrack_shared::store::StoreError> {
/// let store = MemoryCredentialStore::new();
/// let user = store
///     .insert_user(CreateUser {
///         name: "Alice".to_string(),
///         email: "alice@example.com".to_string(),
///         phone_number: "+6281234567890".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///     })
///     .await?;
///
/// assert!(store.find_user_by_id(user.id).await?.is_some());
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::session::{CreateSession, Session};
use crate::models::user::{CreateUser, UpdateUser, User};

/// Error type for credential store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness rule was violated
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl StoreError {
    /// Maps unique-constraint violations to [`StoreError::Conflict`]
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique constraint");
                return StoreError::Conflict(format!("{} already exists", constraint));
            }
        }
        StoreError::Database(err)
    }
}

/// Persistence operations on users and sessions
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Inserts a user; e-mail and phone number must be unused
    async fn insert_user(&self, data: CreateUser) -> Result<User, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError>;

    /// Any user holding the e-mail or the phone number
    async fn find_user_by_email_or_phone(
        &self,
        email: &str,
        phone: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Applies a partial update; `None` if the user does not exist
    async fn update_user(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError>;

    /// Inserts a session row; existing sessions are left alone
    async fn insert_session(&self, data: CreateSession) -> Result<Session, StoreError>;

    /// The most recently created session of a user
    async fn latest_session_for_user(&self, user_id: Uuid) -> Result<Option<Session>, StoreError>;

    /// The session holding exactly this refresh token for this user
    async fn find_session(
        &self,
        user_id: Uuid,
        refresh_token: &str,
    ) -> Result<Option<Session>, StoreError>;

    /// Overwrites a session's refresh token and expiry in place
    ///
    /// Only succeeds while the row still holds `current_token`; `None`
    /// means the row is gone or another refresh already rotated it.
    async fn rotate_session(
        &self,
        session_id: Uuid,
        current_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError>;

    /// Deletes all sessions of a user, returning the number removed
    async fn delete_sessions_for_user(&self, user_id: Uuid) -> Result<u64, StoreError>;
}
