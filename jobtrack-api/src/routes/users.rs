/// Account endpoints for the authenticated user
///
/// # Endpoints
///
/// - `GET    /users/profile-data`
/// - `PUT    /users/update-profile-data`
/// - `PUT    /users/update-password`
/// - `PUT    /users/profile-picture` (multipart field `profile_picture`)
/// - `DELETE /users/profile-picture`
/// - `POST   /users/post-resume` (multipart field `resume`)
/// - `DELETE /users/delete-resume`
/// - `GET    /users/get-resume`
///
/// Replacing or deleting a file removes the old one from storage after the
/// user row has been updated; a failed removal is logged and ignored.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::AppJson,
    response::ApiResponse,
    routes::validate_request,
};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Extension,
};
use bytes::Bytes;
use jobtrack_shared::{
    auth::{context::UserClaims, password},
    models::user::{validate_phone_number, PublicUser, UpdateUser, User},
    storage::{self, PROFILE_PICTURE_FOLDER, RESUME_FOLDER},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Profile update; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,

    #[validate(email(message = "Valid email is required"))]
    pub email: Option<String>,

    pub phone_number: Option<String>,
}

/// Password change
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    /// At least six characters
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ResumePayload {
    pub resume_url: String,
}

#[derive(Debug, Serialize)]
pub struct ProfilePicturePayload {
    pub profile_picture_url: String,
}

async fn current_user(state: &AppState, user_id: Uuid) -> ApiResult<User> {
    state
        .credentials
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

async fn apply_update(state: &AppState, user_id: Uuid, update: UpdateUser) -> ApiResult<User> {
    state
        .credentials
        .update_user(user_id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Best-effort removal of a replaced file
async fn discard_file(state: &AppState, url: Option<String>) {
    if let Some(url) = url {
        if let Err(e) = state.storage.delete_by_url(&url).await {
            tracing::warn!(error = %e, url = %url, "Failed to remove replaced file");
        }
    }
}

/// Reads the named file field from a multipart body
///
/// Returns the part's content type and bytes.
async fn read_file_field(
    multipart: Result<Multipart, MultipartRejection>,
    field_name: &str,
) -> ApiResult<(Option<String>, Bytes)> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(field_name) {
            let content_type = field.content_type().map(str::to_owned);
            let bytes = field.bytes().await?;
            return Ok((content_type, bytes));
        }
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> ApiResult<ApiResponse<PublicUser>> {
    let user = current_user(&state, claims.user_id).await?;

    Ok(ApiResponse::ok(
        "User profile retrieved successfully",
        PublicUser::from(&user),
    ))
}

/// Update name, e-mail and/or phone number
///
/// # Errors
///
/// - `400 Bad Request`: nothing to update, or validation failed
/// - `404 Not Found`: the user no longer exists
/// - `409 Conflict`: e-mail or phone number taken by another user
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    AppJson(req): AppJson<UpdateProfileRequest>,
) -> ApiResult<ApiResponse<PublicUser>> {
    if req.name.is_none() && req.email.is_none() && req.phone_number.is_none() {
        return Err(ApiError::BadRequest("Please fill data".to_string()));
    }

    let phone_check = req
        .phone_number
        .as_deref()
        .map_or(Ok(()), validate_phone_number);
    validate_request(&req, vec![("phone_number", phone_check)])?;

    let user = apply_update(
        &state,
        claims.user_id,
        UpdateUser {
            name: req.name,
            email: req.email,
            phone_number: req.phone_number,
            ..Default::default()
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(ApiResponse::ok(
        "User profile updated successfully",
        PublicUser::from(&user),
    ))
}

/// Change password after checking the current one
///
/// Existing sessions stay valid.
pub async fn update_password(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    AppJson(req): AppJson<UpdatePasswordRequest>,
) -> ApiResult<ApiResponse<()>> {
    validate_request(
        &req,
        vec![(
            "new_password",
            password::validate_password_length(&req.new_password),
        )],
    )?;

    let user = current_user(&state, claims.user_id).await?;

    if !password::verify_password(&req.current_password, &user.password_hash)? {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.new_password)?;
    apply_update(
        &state,
        user.id,
        UpdateUser {
            password_hash: Some(password_hash),
            ..Default::default()
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "Password changed");

    Ok(ApiResponse::null("Password changed successfully"))
}

/// Upload or replace the profile picture
pub async fn upload_profile_picture(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<ProfilePicturePayload>> {
    let (content_type, bytes) = read_file_field(multipart, "profile_picture").await?;
    let extension = storage::validate_image(content_type.as_deref(), bytes.len())?;

    let user = current_user(&state, claims.user_id).await?;
    let file_name = storage::image_file_name(user.id, extension);
    let url = state
        .storage
        .put(PROFILE_PICTURE_FOLDER, &file_name, bytes)
        .await?;

    apply_update(
        &state,
        user.id,
        UpdateUser {
            profile_picture_url: Some(Some(url.clone())),
            ..Default::default()
        },
    )
    .await?;
    discard_file(&state, user.profile_picture_url).await;

    Ok(ApiResponse::ok(
        "Profile picture updated successfully",
        ProfilePicturePayload {
            profile_picture_url: url,
        },
    ))
}

pub async fn delete_profile_picture(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> ApiResult<ApiResponse<()>> {
    let user = current_user(&state, claims.user_id).await?;
    let url = user.profile_picture_url.clone().ok_or_else(|| {
        ApiError::NotFound("No profile picture found for this user".to_string())
    })?;

    apply_update(
        &state,
        user.id,
        UpdateUser {
            profile_picture_url: Some(None),
            ..Default::default()
        },
    )
    .await?;
    discard_file(&state, Some(url)).await;

    Ok(ApiResponse::null("Profile picture deleted successfully"))
}

/// Upload or replace the resume (PDF)
pub async fn upload_resume(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<ResumePayload>> {
    let (content_type, bytes) = read_file_field(multipart, "resume").await?;
    storage::validate_resume(content_type.as_deref(), bytes.len())?;

    let user = current_user(&state, claims.user_id).await?;
    let file_name = storage::resume_file_name(user.id);
    let url = state.storage.put(RESUME_FOLDER, &file_name, bytes).await?;

    apply_update(
        &state,
        user.id,
        UpdateUser {
            resume_url: Some(Some(url.clone())),
            ..Default::default()
        },
    )
    .await?;
    discard_file(&state, user.resume_url).await;

    tracing::info!(user_id = %user.id, "Resume uploaded");

    Ok(ApiResponse::ok(
        "Resume uploaded successfully",
        ResumePayload { resume_url: url },
    ))
}

fn no_resume() -> ApiError {
    ApiError::NotFound("No resume found for this user".to_string())
}

pub async fn delete_resume(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> ApiResult<ApiResponse<()>> {
    let user = current_user(&state, claims.user_id).await?;
    let url = user.resume_url.clone().ok_or_else(no_resume)?;

    apply_update(
        &state,
        user.id,
        UpdateUser {
            resume_url: Some(None),
            ..Default::default()
        },
    )
    .await?;
    discard_file(&state, Some(url)).await;

    Ok(ApiResponse::null("Resume deleted successfully"))
}

pub async fn get_resume(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> ApiResult<ApiResponse<ResumePayload>> {
    let user = current_user(&state, claims.user_id).await?;
    let resume_url = user.resume_url.ok_or_else(no_resume)?;

    Ok(ApiResponse::ok(
        "Resume retrieved successfully",
        ResumePayload { resume_url },
    ))
}
