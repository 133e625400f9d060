/// PostgreSQL-backed [`CredentialStore`]
///
/// Thin delegation to the sqlx model methods on [`User`] and [`Session`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::models::session::{CreateSession, Session};
use crate::models::user::{CreateUser, UpdateUser, User};

/// Credential store on a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn insert_user(&self, data: CreateUser) -> Result<User, StoreError> {
        User::create(&self.pool, data)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_phone(&self.pool, phone).await?)
    }

    async fn find_user_by_email_or_phone(
        &self,
        email: &str,
        phone: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email_or_phone(&self.pool, email, phone).await?)
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError> {
        User::update(&self.pool, id, data)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn insert_session(&self, data: CreateSession) -> Result<Session, StoreError> {
        Ok(Session::create(&self.pool, data).await?)
    }

    async fn latest_session_for_user(&self, user_id: Uuid) -> Result<Option<Session>, StoreError> {
        Ok(Session::latest_for_user(&self.pool, user_id).await?)
    }

    async fn find_session(
        &self,
        user_id: Uuid,
        refresh_token: &str,
    ) -> Result<Option<Session>, StoreError> {
        Ok(Session::find_by_user_and_token(&self.pool, user_id, refresh_token).await?)
    }

    async fn rotate_session(
        &self,
        session_id: Uuid,
        current_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        Ok(Session::rotate(&self.pool, session_id, current_token, refresh_token, expires_at).await?)
    }

    async fn delete_sessions_for_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        Ok(Session::delete_for_user(&self.pool, user_id).await?)
    }
}
