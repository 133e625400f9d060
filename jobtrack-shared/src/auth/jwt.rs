/// Access/refresh token issuing and verification
///
/// Tokens are HS256-signed JWTs. Access and refresh tokens are signed with
/// **different** secrets, so a refresh token can never pass as an access
/// token (and vice versa) even before the `token_type` claim is checked.
///
/// # Lifetimes
///
/// - **Access token**: short-lived (default 1 hour), stateless
/// - **Refresh token**: long-lived (default 7 days), only honoured while a
///   matching session row exists (see [`crate::auth::session`])
///
/// # Expiry
///
/// Validation runs with zero leeway, and a token whose `exp` equals the
/// current second is already expired.
///
/// # Example
///
/// ```
/// use jobtrack_shared::auth::jwt::{TokenConfig, TokenIssuer};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = TokenConfig::new("access-secret", "refresh-secret")?;
/// let issuer = TokenIssuer::new(config);
///
/// let user_id = Uuid::new_v4();
/// let pair = issuer.issue_pair(user_id, "alice@example.com")?;
///
/// let claims = issuer.verify_access(&pair.access_token)?;
/// assert_eq!(claims.sub, user_id);
/// assert_eq!(pair.expires_in, 3600);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Issuer claim stamped on every token
pub const ISSUER: &str = "jobtrack";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// A signing secret was not configured
    #[error("{0} is not configured")]
    MissingSecret(&'static str),

    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, issuer or structure check failed
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token is well-formed but of the other kind
    #[error("Expected {expected} token, got {actual} token")]
    WrongType {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token (short-lived, sent as `Authorization: Bearer`)
    Access,

    /// Refresh token (long-lived, exchanged at `/auth/refresh-token`)
    Refresh,
}

impl TokenType {
    /// Gets default lifetime for token type
    pub fn default_ttl(&self) -> Duration {
        match self {
            TokenType::Access => Duration::hours(1),
            TokenType::Refresh => Duration::days(7),
        }
    }

    /// Gets token type as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims
///
/// `sub` and `email` are the identity the auth gate hands to handlers.
/// `jti` is random per token so that two tokens minted for the same user
/// within the same second are still distinct strings, which refresh-token
/// rotation relies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// User e-mail at issue time
    pub email: String,

    /// Issuer - Always "jobtrack"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Unique token ID
    pub jti: Uuid,

    /// Token type
    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims issued at `issued_at` and expiring `ttl` later
    pub fn new(
        user_id: Uuid,
        email: impl Into<String>,
        token_type: TokenType,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: user_id,
            email: email.into(),
            iss: ISSUER.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            nbf: issued_at.timestamp(),
            jti: Uuid::new_v4(),
            token_type,
        }
    }

    /// Checks if token has expired (strict: `exp == now` is expired)
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Expiration as a UTC timestamp
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Signing configuration
///
/// Secrets are passed in explicitly; there is no environment lookup in
/// this module. Construction fails if either secret is empty.
#[derive(Clone)]
pub struct TokenConfig {
    access_secret: String,
    refresh_secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenConfig {
    /// Creates a config with default lifetimes (1h access, 7d refresh)
    ///
    /// # Errors
    ///
    /// Returns `JwtError::MissingSecret` if either secret is empty.
    pub fn new(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
    ) -> Result<Self, JwtError> {
        let access_secret = access_secret.into();
        let refresh_secret = refresh_secret.into();

        if access_secret.trim().is_empty() {
            return Err(JwtError::MissingSecret("JWT_SECRET"));
        }
        if refresh_secret.trim().is_empty() {
            return Err(JwtError::MissingSecret("JWT_REFRESH_SECRET"));
        }

        Ok(Self {
            access_secret,
            refresh_secret,
            access_ttl: TokenType::Access.default_ttl(),
            refresh_ttl: TokenType::Refresh.default_ttl(),
        })
    }

    /// Overrides the token lifetimes
    pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    /// Access token lifetime
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Refresh token lifetime
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    fn secret_for(&self, token_type: TokenType) -> &str {
        match token_type {
            TokenType::Access => &self.access_secret,
            TokenType::Refresh => &self.refresh_secret,
        }
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// A freshly minted access/refresh pair
///
/// Serializes as `{access_token, refresh_token, expires_in}`, the shape
/// returned by register, login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    /// Signed access token
    pub access_token: String,

    /// Signed refresh token
    pub refresh_token: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// The refresh token's `exp`; its session row expires at the same instant
    #[serde(skip)]
    pub refresh_expires_at: DateTime<Utc>,
}

/// Issues and verifies token pairs for one [`TokenConfig`]
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    config: TokenConfig,
}

impl TokenIssuer {
    /// Creates an issuer from an already validated config
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    /// Mints an access token and a refresh token for the same identity
    ///
    /// Both tokens share the same issue instant; their expiries come from
    /// the configured lifetimes.
    pub fn issue_pair(&self, user_id: Uuid, email: &str) -> Result<TokenPair, JwtError> {
        let now = Utc::now();

        let access_claims = Claims::new(
            user_id,
            email,
            TokenType::Access,
            now,
            self.config.access_ttl,
        );
        let refresh_claims = Claims::new(
            user_id,
            email,
            TokenType::Refresh,
            now,
            self.config.refresh_ttl,
        );

        let refresh_expires_at = refresh_claims
            .expires_at()
            .ok_or_else(|| JwtError::CreateError("refresh expiry out of range".to_string()))?;

        let access_token = create_token(&access_claims, self.config.secret_for(TokenType::Access))?;
        let refresh_token =
            create_token(&refresh_claims, self.config.secret_for(TokenType::Refresh))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.config.access_ttl.num_seconds(),
            refresh_expires_at,
        })
    }

    /// Verifies an access token's signature, issuer, expiry and type
    pub fn verify_access(&self, token: &str) -> Result<Claims, JwtError> {
        self.verify(token, TokenType::Access)
    }

    /// Verifies a refresh token's signature, issuer, expiry and type
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, JwtError> {
        self.verify(token, TokenType::Refresh)
    }

    fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, JwtError> {
        let claims = validate_token(token, self.config.secret_for(expected))?;

        if claims.token_type != expected {
            return Err(JwtError::WrongType {
                expected: expected.as_str(),
                actual: claims.token_type.as_str(),
            });
        }

        Ok(claims)
    }
}

/// Signs claims with HS256
///
/// Deterministic: the same claims and secret always yield the same string.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a token and extracts its claims
///
/// Checks signature, issuer, `nbf` and `exp` with zero leeway, then
/// applies the strict `exp <= now` rule on top of the library check.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::ValidationError(e.to_string()),
    })?;

    if token_data.claims.is_expired() {
        return Err(JwtError::Expired);
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            TokenConfig::new("access-secret-for-tests", "refresh-secret-for-tests").unwrap(),
        )
    }

    #[test]
    fn test_default_ttls() {
        assert_eq!(TokenType::Access.default_ttl(), Duration::hours(1));
        assert_eq!(TokenType::Refresh.default_ttl(), Duration::days(7));

        let config = TokenConfig::new("a", "b").unwrap();
        assert_eq!(config.access_ttl().num_seconds(), 3600);
        assert_eq!(config.refresh_ttl().num_seconds(), 7 * 24 * 3600);
    }

    #[test]
    fn test_missing_secrets_rejected() {
        assert!(matches!(
            TokenConfig::new("", "refresh"),
            Err(JwtError::MissingSecret("JWT_SECRET"))
        ));
        assert!(matches!(
            TokenConfig::new("access", "   "),
            Err(JwtError::MissingSecret("JWT_REFRESH_SECRET"))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = TokenConfig::new("super-secret-a", "super-secret-b").unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_issue_and_verify_pair() {
        let issuer = issuer();
        let user_id = Uuid::new_v4();

        let pair = issuer.issue_pair(user_id, "alice@example.com").unwrap();
        assert_eq!(pair.expires_in, 3600);

        let access = issuer.verify_access(&pair.access_token).unwrap();
        assert_eq!(access.sub, user_id);
        assert_eq!(access.email, "alice@example.com");
        assert_eq!(access.iss, ISSUER);
        assert_eq!(access.token_type, TokenType::Access);

        let refresh = issuer.verify_refresh(&pair.refresh_token).unwrap();
        assert_eq!(refresh.sub, user_id);
        assert_eq!(refresh.token_type, TokenType::Refresh);
        assert_eq!(refresh.expires_at(), Some(pair.refresh_expires_at));
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let issuer = issuer();
        let pair = issuer.issue_pair(Uuid::new_v4(), "bob@example.com").unwrap();

        assert!(issuer.verify_access(&pair.refresh_token).is_err());
        assert!(issuer.verify_refresh(&pair.access_token).is_err());
    }

    #[test]
    fn test_wrong_type_with_shared_secret() {
        let secret = "same-secret";
        let claims = Claims::new(
            Uuid::new_v4(),
            "x@example.com",
            TokenType::Refresh,
            Utc::now(),
            Duration::hours(1),
        );
        let token = create_token(&claims, secret).unwrap();

        let issuer = TokenIssuer::new(TokenConfig::new(secret, secret).unwrap());
        assert!(matches!(
            issuer.verify_access(&token),
            Err(JwtError::WrongType { expected: "access", actual: "refresh" })
        ));
    }

    #[test]
    fn test_signing_is_deterministic() {
        let claims = Claims::new(
            Uuid::new_v4(),
            "det@example.com",
            TokenType::Access,
            Utc::now(),
            Duration::hours(1),
        );

        let a = create_token(&claims, "secret").unwrap();
        let b = create_token(&claims, "secret").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_pairs_minted_back_to_back_differ() {
        let issuer = issuer();
        let user_id = Uuid::new_v4();

        let first = issuer.issue_pair(user_id, "a@example.com").unwrap();
        let second = issuer.issue_pair(user_id, "a@example.com").unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);
        assert_ne!(first.access_token, second.access_token);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new(
            Uuid::new_v4(),
            "a@example.com",
            TokenType::Access,
            Utc::now(),
            Duration::hours(1),
        );
        let token = create_token(&claims, "secret1").unwrap();

        assert!(matches!(
            validate_token(&token, "secret2"),
            Err(JwtError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::new(
            Uuid::new_v4(),
            "a@example.com",
            TokenType::Access,
            Utc::now(),
            Duration::seconds(-3600),
        );
        assert!(claims.is_expired());

        let token = create_token(&claims, "secret").unwrap();
        assert!(matches!(validate_token(&token, "secret"), Err(JwtError::Expired)));
    }

    #[test]
    fn test_token_expiring_now_is_expired() {
        let now = Utc::now();
        let claims = Claims::new(
            Uuid::new_v4(),
            "a@example.com",
            TokenType::Access,
            now,
            Duration::zero(),
        );
        assert!(claims.is_expired());

        let token = create_token(&claims, "secret").unwrap();
        assert!(validate_token(&token, "secret").is_err());
    }

    #[test]
    fn test_garbage_token() {
        assert!(matches!(
            validate_token("not.a.jwt", "secret"),
            Err(JwtError::ValidationError(_))
        ));
    }

    #[test]
    fn test_custom_ttls() {
        let config = TokenConfig::new("a", "b")
            .unwrap()
            .with_ttls(Duration::minutes(15), Duration::days(30));
        let issuer = TokenIssuer::new(config);

        let pair = issuer.issue_pair(Uuid::new_v4(), "a@example.com").unwrap();
        assert_eq!(pair.expires_in, 900);

        let remaining = pair.refresh_expires_at - Utc::now();
        assert!(remaining > Duration::days(29));
        assert!(remaining <= Duration::days(30));
    }
}
