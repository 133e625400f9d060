/// Calendar reminder endpoints (authenticated, scoped to the caller)
///
/// - `GET|POST       /schedules/my-schedules`
/// - `GET|PUT|DELETE /schedules/:id`
///
/// `time` accepts `HH:MM` or `HH:MM:SS`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath},
    response::ApiResponse,
    routes::{nullable, validate_request},
};
use axum::{extract::State, Extension};
use chrono::{NaiveDate, NaiveTime};
use jobtrack_shared::{
    auth::context::UserClaims,
    models::schedule::{CreateSchedule, Schedule, UpdateSchedule},
};
use serde::{de, Deserialize, Deserializer};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CreateScheduleRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    pub description: Option<String>,

    #[validate(required(message = "Date is required"))]
    pub date: Option<NaiveDate>,

    #[validate(required(message = "Time is required"))]
    #[serde(deserialize_with = "clock_time")]
    pub time: Option<NaiveTime>,
}

/// Partial update; `null` clears the description
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateScheduleRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: Option<String>,

    #[serde(deserialize_with = "nullable")]
    pub description: Option<Option<String>>,

    pub date: Option<NaiveDate>,

    #[serde(deserialize_with = "clock_time")]
    pub time: Option<NaiveTime>,
}

fn clock_time<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    NaiveTime::parse_from_str(&raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
        .map(Some)
        .map_err(|_| de::Error::custom(format!("invalid time '{}', expected HH:MM", raw)))
}

fn not_found() -> ApiError {
    ApiError::NotFound("Schedule not found".to_string())
}

pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    AppJson(req): AppJson<CreateScheduleRequest>,
) -> ApiResult<ApiResponse<Schedule>> {
    validate_request(&req, Vec::new())?;

    let (Some(date), Some(time)) = (req.date, req.time) else {
        return Err(ApiError::BadRequest("Invalid schedule".to_string()));
    };

    let schedule = Schedule::create(
        &state.db,
        claims.user_id,
        CreateSchedule {
            title: req.title,
            description: req.description,
            date,
            time,
        },
    )
    .await?;

    tracing::debug!(schedule_id = %schedule.id, user_id = %claims.user_id, "Schedule created");

    Ok(ApiResponse::created("Schedule created successfully", schedule))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> ApiResult<ApiResponse<Vec<Schedule>>> {
    let schedules = Schedule::list_for_user(&state.db, claims.user_id).await?;

    Ok(ApiResponse::ok("Schedules retrieved successfully", schedules))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<Schedule>> {
    let schedule = Schedule::find_for_user(&state.db, id, claims.user_id)
        .await?
        .ok_or_else(not_found)?;

    Ok(ApiResponse::ok("Schedule retrieved successfully", schedule))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateScheduleRequest>,
) -> ApiResult<ApiResponse<Schedule>> {
    validate_request(&req, Vec::new())?;

    let schedule = Schedule::update(
        &state.db,
        id,
        claims.user_id,
        UpdateSchedule {
            title: req.title,
            description: req.description,
            date: req.date,
            time: req.time,
        },
    )
    .await?
    .ok_or_else(not_found)?;

    Ok(ApiResponse::ok("Schedule updated successfully", schedule))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    if !Schedule::delete(&state.db, id, claims.user_id).await? {
        return Err(not_found());
    }

    Ok(ApiResponse::null("Schedule deleted successfully"))
}
