/// Authentication for JobTrack
///
/// # Modules
///
/// - [`jwt`]: HS256 access/refresh tokens with separate secrets
/// - [`password`]: Argon2id password hashing
/// - [`session`]: session registry lifecycle and [`session::AuthError`]
/// - [`context`]: the [`context::UserClaims`] handed to handlers
///
/// # Example
///
/// ```
/// use jobtrack_shared::auth::jwt::{TokenConfig, TokenIssuer};
/// use jobtrack_shared::auth::password::{hash_password, verify_password};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let issuer = TokenIssuer::new(TokenConfig::new("access-secret", "refresh-secret")?);
/// let pair = issuer.issue_pair(Uuid::new_v4(), "user@example.com")?;
/// assert_ne!(pair.access_token, pair.refresh_token);
/// # Ok(())
/// # }
/// ```

pub mod context;
pub mod jwt;
pub mod password;
pub mod session;
