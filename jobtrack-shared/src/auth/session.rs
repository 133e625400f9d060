/// Session lifecycle: issue, authenticate, refresh, revoke
///
/// Access tokens are stateless, but every request through the auth gate is
/// also checked against the session registry, so logging out (deleting the
/// user's sessions) locks out access tokens that are still within their
/// lifetime.
///
/// # Flow
///
/// ```text
/// login/register ─► start_session ─► TokenPair + sessions row
/// request        ─► authenticate  ─► UserClaims (latest session must be live)
/// refresh-token  ─► refresh       ─► new TokenPair, row rotated in place
/// logout         ─► revoke        ─► all rows for the user deleted
/// ```
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use jobtrack_shared::auth::jwt::{TokenConfig, TokenIssuer};
/// use jobtrack_shared::auth::session::SessionManager;
/// use jobtrack_shared::store::memory::MemoryCredentialStore;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let issuer = TokenIssuer::new(TokenConfig::new("access", "refresh")?);
/// let sessions = SessionManager::new(Arc::new(MemoryCredentialStore::new()), issuer);
///
/// let user_id = Uuid::new_v4();
/// let pair = sessions.start_session(user_id, "alice@example.com").await?;
///
/// let header = format!("Bearer {}", pair.access_token);
/// let claims = sessions.authenticate(Some(&header)).await?;
/// assert_eq!(claims.user_id, user_id);
///
/// sessions.revoke(user_id).await?;
/// assert!(sessions.authenticate(Some(&header)).await.is_err());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::context::{bearer_token, UserClaims};
use super::jwt::{JwtError, TokenIssuer, TokenPair};
use crate::models::session::{CreateSession, Session};
use crate::store::{CredentialStore, StoreError};

/// Failures of the session lifecycle
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization: Bearer <token>` header, or an empty token
    #[error("Access denied. No token provided.")]
    MissingToken,

    /// Access token signature, issuer, type or expiry check failed
    #[error("Invalid token")]
    InvalidSignature,

    /// The user has no session rows
    #[error("Invalid token or session expired")]
    NoActiveSession,

    /// The session row exists but `expires_at <= now`
    #[error("Session expired")]
    SessionExpired,

    /// Refresh request without a token
    #[error("Refresh token is required")]
    MissingRefreshToken,

    /// Refresh token signature, issuer, type or expiry check failed
    #[error("Invalid refresh token")]
    InvalidRefreshSignature,

    /// No session holds this exact refresh token
    #[error("Invalid refresh token")]
    SessionNotFound,

    /// The token's subject no longer exists
    #[error("User not found")]
    UserNotFound,

    /// Signing keys are missing or unusable
    #[error("Server configuration error: {0}")]
    Configuration(String),

    /// Credential store failure
    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        AuthError::Configuration(err.to_string())
    }
}

/// Session registry on top of a token issuer and a credential store
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    tokens: TokenIssuer,
}

impl SessionManager {
    pub fn new(store: Arc<dyn CredentialStore>, tokens: TokenIssuer) -> Self {
        Self { store, tokens }
    }

    /// Mints an access/refresh pair without touching the registry
    pub fn issue_token_pair(&self, user_id: Uuid, email: &str) -> Result<TokenPair, AuthError> {
        Ok(self.tokens.issue_pair(user_id, email)?)
    }

    /// Records a refresh token in the registry
    ///
    /// Existing sessions of the user are kept; each login adds a row.
    pub async fn create_session(
        &self,
        user_id: Uuid,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, AuthError> {
        let session = self
            .store
            .insert_session(CreateSession {
                user_id,
                refresh_token: refresh_token.to_string(),
                expires_at,
            })
            .await?;

        debug!(
            user_id = %user_id,
            session_id = %session.id,
            expires_at = %expires_at,
            "Session created"
        );

        Ok(session)
    }

    /// Issues a pair and records its refresh token, as register and login do
    pub async fn start_session(&self, user_id: Uuid, email: &str) -> Result<TokenPair, AuthError> {
        let pair = self.issue_token_pair(user_id, email)?;
        self.create_session(user_id, &pair.refresh_token, pair.refresh_expires_at)
            .await?;

        info!(user_id = %user_id, "Session started");
        Ok(pair)
    }

    /// Resolves an `Authorization` header value into the caller's identity
    ///
    /// Only the user's most recently created session is consulted. An older
    /// live session does not rescue a user whose latest one has expired.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MissingToken`]: header absent, not `Bearer`, or empty
    /// - [`AuthError::InvalidSignature`]: token fails verification
    /// - [`AuthError::NoActiveSession`]: the user has no sessions
    /// - [`AuthError::SessionExpired`]: the latest session has expired
    pub async fn authenticate(&self, header: Option<&str>) -> Result<UserClaims, AuthError> {
        let token = bearer_token(header)?;

        let claims = self.tokens.verify_access(token).map_err(|e| {
            debug!(error = %e, "Access token rejected");
            AuthError::InvalidSignature
        })?;

        let session = self
            .store
            .latest_session_for_user(claims.sub)
            .await?
            .ok_or_else(|| {
                debug!(user_id = %claims.sub, "No session for access token");
                AuthError::NoActiveSession
            })?;

        if session.is_expired() {
            debug!(user_id = %claims.sub, session_id = %session.id, "Latest session expired");
            return Err(AuthError::SessionExpired);
        }

        Ok(UserClaims {
            user_id: claims.sub,
            email: claims.email,
        })
    }

    /// Exchanges a refresh token for a new pair, rotating the session row
    ///
    /// The presented token stops working once this returns.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MissingRefreshToken`]: token absent or empty
    /// - [`AuthError::InvalidRefreshSignature`]: token fails verification
    /// - [`AuthError::SessionNotFound`]: no session holds this token
    /// - [`AuthError::SessionExpired`]: the session has expired
    /// - [`AuthError::UserNotFound`]: the user was deleted
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<TokenPair, AuthError> {
        let refresh_token = refresh_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingRefreshToken)?;

        let claims = self.tokens.verify_refresh(refresh_token).map_err(|e| {
            debug!(error = %e, "Refresh token rejected");
            AuthError::InvalidRefreshSignature
        })?;

        let session = self
            .store
            .find_session(claims.sub, refresh_token)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "Refresh token has no matching session");
                AuthError::SessionNotFound
            })?;

        if session.is_expired() {
            debug!(session_id = %session.id, "Refresh attempted on expired session");
            return Err(AuthError::SessionExpired);
        }

        let user = self
            .store
            .find_user_by_id(claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let pair = self.issue_token_pair(user.id, &user.email)?;

        self.store
            .rotate_session(
                session.id,
                refresh_token,
                &pair.refresh_token,
                pair.refresh_expires_at,
            )
            .await?
            .ok_or_else(|| {
                warn!(session_id = %session.id, "Refresh token was rotated concurrently");
                AuthError::SessionNotFound
            })?;

        info!(user_id = %user.id, session_id = %session.id, "Session refreshed");
        Ok(pair)
    }

    /// Deletes every session of the user; safe to call repeatedly
    pub async fn revoke(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let removed = self.store.delete_sessions_for_user(user_id).await?;
        info!(user_id = %user_id, removed, "Sessions revoked");
        Ok(removed)
    }
}
