/// Authenticated request context
///
/// The auth gate resolves an `Authorization` header into [`UserClaims`] and
/// inserts them into the request extensions. Handlers take them with
/// `Extension<UserClaims>`.
///
/// ```
/// use jobtrack_shared::auth::context::bearer_token;
///
/// assert_eq!(bearer_token(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
/// assert!(bearer_token(Some("Basic dXNlcjpwYXNz")).is_err());
/// assert!(bearer_token(None).is_err());
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session::AuthError;

/// Identity of the caller, as carried by a verified access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    pub user_id: Uuid,
    pub email: String,
}

/// Extracts the token from an `Authorization: Bearer <token>` header value
///
/// A missing header, another scheme, or an empty token all yield
/// [`AuthError::MissingToken`].
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let token = header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AuthError::MissingToken)?;

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(Some("Bearer token123")).unwrap(), "token123");
    }

    #[test]
    fn test_bearer_token_rejects_missing_or_empty() {
        assert!(matches!(bearer_token(None), Err(AuthError::MissingToken)));
        assert!(matches!(bearer_token(Some("")), Err(AuthError::MissingToken)));
        assert!(matches!(bearer_token(Some("Bearer ")), Err(AuthError::MissingToken)));
        assert!(matches!(bearer_token(Some("Bearer    ")), Err(AuthError::MissingToken)));
        assert!(matches!(bearer_token(Some("Token abc")), Err(AuthError::MissingToken)));
        assert!(matches!(bearer_token(Some("bearer abc")), Err(AuthError::MissingToken)));
    }
}
