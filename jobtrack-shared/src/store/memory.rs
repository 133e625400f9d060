/// In-process [`CredentialStore`]
///
/// Mirrors the PostgreSQL schema rules that matter to callers: unique
/// e-mail and phone number, and "latest session" meaning the most recently
/// inserted row. A single `RwLock` serializes writers the way row locks
/// would.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::models::session::{CreateSession, Session};
use crate::models::user::{CreateUser, UpdateUser, User};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    /// Insertion order doubles as creation order
    sessions: Vec<Session>,
}

/// Credential store kept in memory
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    tables: RwLock<Tables>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions for a user
    pub async fn session_count(&self, user_id: Uuid) -> usize {
        self.tables
            .read()
            .await
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .count()
    }

    /// Overwrites the expiry of every session of a user
    ///
    /// Lets tests age a session without waiting on the clock.
    pub async fn set_session_expiry(&self, user_id: Uuid, expires_at: DateTime<Utc>) {
        let mut tables = self.tables.write().await;
        for session in tables.sessions.iter_mut().filter(|s| s.user_id == user_id) {
            session.expires_at = expires_at;
        }
    }
}

fn check_unique(
    users: &[User],
    skip_id: Option<Uuid>,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<(), StoreError> {
    for user in users.iter().filter(|u| Some(u.id) != skip_id) {
        if email == Some(user.email.as_str()) {
            return Err(StoreError::Conflict("users_email_key already exists".to_string()));
        }
        if phone == Some(user.phone_number.as_str()) {
            return Err(StoreError::Conflict(
                "users_phone_number_key already exists".to_string(),
            ));
        }
    }
    Ok(())
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert_user(&self, data: CreateUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        check_unique(
            &tables.users,
            None,
            Some(&data.email),
            Some(&data.phone_number),
        )?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            phone_number: data.phone_number,
            password_hash: data.password_hash,
            profile_picture_url: None,
            resume_url: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.phone_number == phone).cloned())
    }

    async fn find_user_by_email_or_phone(
        &self,
        email: &str,
        phone: &str,
    ) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.email == email || u.phone_number == phone)
            .cloned())
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        check_unique(
            &tables.users,
            Some(id),
            data.email.as_deref(),
            data.phone_number.as_deref(),
        )?;

        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                data.apply_to(user);
                Ok(Some(user.clone()))
            }
            None => Ok(None),
        }
    }

    async fn insert_session(&self, data: CreateSession) -> Result<Session, StoreError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            refresh_token: data.refresh_token,
            expires_at: data.expires_at,
            created_at: now,
            updated_at: now,
        };
        tables.sessions.push(session.clone());
        Ok(session)
    }

    async fn latest_session_for_user(&self, user_id: Uuid) -> Result<Option<Session>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .iter()
            .rev()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn find_session(
        &self,
        user_id: Uuid,
        refresh_token: &str,
    ) -> Result<Option<Session>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .iter()
            .find(|s| s.user_id == user_id && s.refresh_token == refresh_token)
            .cloned())
    }

    async fn rotate_session(
        &self,
        session_id: Uuid,
        current_token: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        let mut tables = self.tables.write().await;
        match tables
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id && s.refresh_token == current_token)
        {
            Some(session) => {
                session.refresh_token = refresh_token.to_string();
                session.expires_at = expires_at;
                session.updated_at = Utc::now();
                Ok(Some(session.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_sessions_for_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|s| s.user_id != user_id);
        Ok((before - tables.sessions.len()) as u64)
    }
}
