/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/register`: create an account and start a session
/// - `POST /auth/login`: log in with e-mail or phone number
/// - `POST /auth/logout`: end every session of the caller (authenticated)
/// - `POST /auth/refresh-token`: rotate a refresh token into a new pair
///
/// Register and login answer with the same payload:
///
/// ```json
/// {
///   "user": { "id": "uuid", "name": "Alice", "email": "alice@example.com", "phone_number": "+6281234567890" },
///   "tokens": { "access_token": "eyJ...", "refresh_token": "eyJ...", "expires_in": 3600 }
/// }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::AppJson,
    response::ApiResponse,
    routes::validate_request,
};
use axum::{extract::State, http::StatusCode, Extension};
use jobtrack_shared::{
    auth::{context::UserClaims, jwt::TokenPair, password},
    models::user::{identifier_is_email, validate_phone_number, CreateUser, User},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Valid email is required"))]
    pub email: String,

    /// `+62` followed by 9-12 digits
    pub phone_number: String,

    /// At least six characters
    pub password: String,
}

/// Login request; `identifier` is an e-mail or a phone number
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email or phone number is required"))]
    pub identifier: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// User fields returned by register and login
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: String,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
        }
    }
}

/// Register and login payload
#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub user: AuthUser,
    pub tokens: TokenPair,
}

/// Refresh payload
#[derive(Debug, Serialize)]
pub struct TokensPayload {
    pub tokens: TokenPair,
}

/// Register a new user
///
/// # Errors
///
/// - `400 Bad Request`: validation failed, or e-mail/phone already registered
/// - `409 Conflict`: lost a registration race on e-mail/phone
pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> ApiResult<ApiResponse<AuthPayload>> {
    validate_request(
        &req,
        vec![
            ("phone_number", validate_phone_number(&req.phone_number)),
            ("password", password::validate_password_length(&req.password)),
        ],
    )?;

    if state
        .credentials
        .find_user_by_email_or_phone(&req.email, &req.phone_number)
        .await?
        .is_some()
    {
        return Err(ApiError::BadRequest(
            "User with this email or phone number already exists".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = state
        .credentials
        .insert_user(CreateUser {
            name: req.name,
            email: req.email,
            phone_number: req.phone_number,
            password_hash,
        })
        .await?;

    let tokens = state.sessions.start_session(user.id, &user.email).await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(ApiResponse::created(
        "User registered successfully",
        AuthPayload {
            user: AuthUser::from(&user),
            tokens,
        },
    ))
}

/// Log in with e-mail or phone number
///
/// # Errors
///
/// - `400 Bad Request`: validation failed
/// - `401 Unauthorized`: unknown identifier or wrong password
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<ApiResponse<AuthPayload>> {
    req.validate()?;

    let identifier = req.identifier.trim();
    let user = if identifier_is_email(identifier) {
        state.credentials.find_user_by_email(identifier).await?
    } else {
        state.credentials.find_user_by_phone(identifier).await?
    };

    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());
    let user = user.ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::warn!(user_id = %user.id, "Login with wrong password");
        return Err(invalid());
    }

    let tokens = state.sessions.start_session(user.id, &user.email).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(ApiResponse::ok(
        "Login successful",
        AuthPayload {
            user: AuthUser::from(&user),
            tokens,
        },
    ))
}

/// End every session of the caller
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> ApiResult<ApiResponse<()>> {
    state.sessions.revoke(claims.user_id).await?;

    Ok(ApiResponse::message(StatusCode::OK, "Logged out successfully"))
}

/// Rotate a refresh token into a new pair
///
/// # Errors
///
/// - `400 Bad Request`: no refresh token in the body
/// - `401 Unauthorized`: invalid, unknown, rotated or expired refresh token
/// - `404 Not Found`: the token's user no longer exists
pub async fn refresh_token(
    State(state): State<AppState>,
    AppJson(req): AppJson<RefreshRequest>,
) -> ApiResult<ApiResponse<TokensPayload>> {
    let tokens = state.sessions.refresh(req.refresh_token.as_deref()).await?;

    Ok(ApiResponse::ok(
        "Token refreshed successfully",
        TokensPayload { tokens },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_missing_fields_are_empty() {
        let req: RegisterRequest = serde_json::from_str(r#"{"name": "Alice"}"#).unwrap();
        assert_eq!(req.email, "");

        let err = req.validate().unwrap_err();
        let fields = err.field_errors();
        assert!(fields.contains_key("email"));
        assert!(!fields.contains_key("name"));
    }

    #[test]
    fn test_login_request_validation() {
        let req = LoginRequest {
            identifier: "+6281234567890".to_string(),
            password: "secret".to_string(),
        };
        assert!(req.validate().is_ok());

        let req = LoginRequest::default();
        assert!(req.validate().is_err());
    }
}
