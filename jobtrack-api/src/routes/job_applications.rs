/// Job application endpoints (authenticated, scoped to the caller)
///
/// # Endpoints
///
/// - `GET    /job-applications/statuses`: the 21 pipeline statuses
/// - `GET    /job-applications/group-by-status`: counts per status
/// - `GET    /job-applications?status_id=`: list, newest application first
/// - `POST   /job-applications`: create
/// - `DELETE /job-applications`: delete all of the caller's applications
/// - `GET    /job-applications/:id`: detail with status history
/// - `PUT    /job-applications/:id`: partial update
/// - `DELETE /job-applications/:id`: delete one
///
/// Another user's application is indistinguishable from a missing one.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath, AppQuery},
    response::ApiResponse,
    routes::{nullable, validate_request},
};
use axum::{extract::State, http::StatusCode, Extension};
use chrono::NaiveDate;
use jobtrack_shared::{
    auth::context::UserClaims,
    models::{
        application_status::{ApplicationStatus, StatusSummary},
        job_application::{
            CreateJobApplication, JobApplication, JobApplicationDetail, JobApplicationView,
            UpdateJobApplication,
        },
    },
};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Create request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CreateJobApplicationRequest {
    #[validate(required(message = "Application date is required"))]
    pub application_date: Option<NaiveDate>,

    #[validate(length(min = 1, message = "Job position is required"))]
    pub job_position: String,

    #[validate(length(min = 1, message = "Job Portal is required"))]
    pub job_portal: String,

    pub job_url: Option<String>,

    #[validate(length(min = 1, message = "Company Name is required"))]
    pub company_name: String,

    #[validate(required(message = "Status ID is required"))]
    pub status_id: Option<i32>,

    pub notes: Option<String>,
}

/// Partial update; `null` clears `job_url` or `notes`
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateJobApplicationRequest {
    pub application_date: Option<NaiveDate>,

    #[validate(length(min = 1, message = "Job position is required"))]
    pub job_position: Option<String>,

    #[validate(length(min = 1, message = "Job Portal is required"))]
    pub job_portal: Option<String>,

    #[serde(deserialize_with = "nullable")]
    pub job_url: Option<Option<String>>,

    #[validate(length(min = 1, message = "Company Name is required"))]
    pub company_name: Option<String>,

    pub status_id: Option<i32>,

    #[serde(deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl UpdateJobApplicationRequest {
    fn is_empty(&self) -> bool {
        self.application_date.is_none()
            && self.job_position.is_none()
            && self.job_portal.is_none()
            && self.job_url.is_none()
            && self.company_name.is_none()
            && self.status_id.is_none()
            && self.notes.is_none()
    }
}

/// `?status_id=` filter
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status_id: Option<i32>,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Job application not found".to_string())
}

async fn ensure_status_exists(db: &PgPool, status_id: i32) -> ApiResult<()> {
    if ApplicationStatus::exists(db, status_id).await? {
        Ok(())
    } else {
        Err(ApiError::invalid_field("status_id", "Invalid status ID"))
    }
}

pub async fn list_statuses(
    State(state): State<AppState>,
) -> ApiResult<ApiResponse<Vec<ApplicationStatus>>> {
    let statuses = ApplicationStatus::list_all(&state.db).await?;

    Ok(ApiResponse::ok(
        "Application statuses retrieved successfully",
        statuses,
    ))
}

pub async fn group_by_status(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> ApiResult<ApiResponse<StatusSummary>> {
    let summary = StatusSummary::for_user(&state.db, claims.user_id).await?;

    Ok(ApiResponse::ok(
        "Job application stats retrieved successfully",
        summary,
    ))
}

/// Create an application; records its first history entry
///
/// # Errors
///
/// - `400 Bad Request`: a required field is missing or the status is unknown
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    AppJson(req): AppJson<CreateJobApplicationRequest>,
) -> ApiResult<ApiResponse<()>> {
    validate_request(&req, Vec::new())?;

    // Both are Some once validation passed
    let (Some(application_date), Some(status_id)) = (req.application_date, req.status_id) else {
        return Err(ApiError::BadRequest("Invalid job application".to_string()));
    };
    ensure_status_exists(&state.db, status_id).await?;

    let application = JobApplication::create(
        &state.db,
        claims.user_id,
        CreateJobApplication {
            application_date,
            job_position: req.job_position,
            job_portal: req.job_portal,
            job_url: req.job_url,
            company_name: req.company_name,
            status_id,
            notes: req.notes,
        },
    )
    .await?;

    tracing::info!(
        application_id = %application.id,
        user_id = %claims.user_id,
        "Job application created"
    );

    Ok(ApiResponse::message(
        StatusCode::CREATED,
        "Job application created successfully",
    ))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    AppQuery(query): AppQuery<ListQuery>,
) -> ApiResult<ApiResponse<Vec<JobApplicationView>>> {
    let applications =
        JobApplication::list_for_user(&state.db, claims.user_id, query.status_id).await?;

    Ok(ApiResponse::ok(
        "Job applications retrieved successfully",
        applications,
    ))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<JobApplicationDetail>> {
    let detail = JobApplication::find_detail(&state.db, id, claims.user_id)
        .await?
        .ok_or_else(not_found)?;

    Ok(ApiResponse::ok(
        "Job application retrieved successfully",
        detail,
    ))
}

/// Partial update; a status change appends to the history
pub async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateJobApplicationRequest>,
) -> ApiResult<ApiResponse<JobApplicationView>> {
    if req.is_empty() {
        return Err(ApiError::BadRequest("Please fill data".to_string()));
    }
    validate_request(&req, Vec::new())?;

    if let Some(status_id) = req.status_id {
        ensure_status_exists(&state.db, status_id).await?;
    }

    let view = JobApplication::update(
        &state.db,
        id,
        claims.user_id,
        UpdateJobApplication {
            application_date: req.application_date,
            job_position: req.job_position,
            job_portal: req.job_portal,
            job_url: req.job_url,
            company_name: req.company_name,
            status_id: req.status_id,
            notes: req.notes,
        },
    )
    .await?
    .ok_or_else(not_found)?;

    Ok(ApiResponse::ok("Job application updated successfully", view))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    if !JobApplication::delete(&state.db, id, claims.user_id).await? {
        return Err(not_found());
    }

    Ok(ApiResponse::null("Job application deleted successfully"))
}

pub async fn delete_all(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> ApiResult<ApiResponse<()>> {
    let deleted = JobApplication::delete_all_for_user(&state.db, claims.user_id).await?;

    tracing::info!(user_id = %claims.user_id, deleted, "All job applications deleted");

    Ok(ApiResponse::null("All job application deleted successfully"))
}
