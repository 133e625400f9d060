/// Response envelope shared by every endpoint
///
/// ```json
/// {
///   "status": "success",
///   "status_code": 200,
///   "message": "Job applications retrieved successfully",
///   "data": [ ... ]
/// }
/// ```
///
/// `data` is left out when a handler has nothing to return and is `null`
/// when it explicitly returns "no data". Validation failures add an
/// `errors` array.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::ValidationErrorDetail;

/// `status` field of the envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// The envelope itself
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: ResponseStatus,
    pub status_code: u16,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationErrorDetail>>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status: ResponseStatus::Success,
            status_code: status.as_u16(),
            message: message.into(),
            data,
            errors: None,
        }
    }

    /// 200 with a payload
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::success(StatusCode::OK, message, Some(data))
    }

    /// 201 with a payload
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::success(StatusCode::CREATED, message, Some(data))
    }
}

impl ApiResponse<()> {
    /// Message only, no `data` key
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self::success(status, message, None)
    }

    /// 200 with `"data": null`
    pub fn null(message: impl Into<String>) -> Self {
        Self::success(StatusCode::OK, message, Some(()))
    }

    /// Error envelope
    pub fn error(
        status: StatusCode,
        message: impl Into<String>,
        errors: Option<Vec<ValidationErrorDetail>>,
    ) -> Self {
        Self {
            status: ResponseStatus::Error,
            status_code: status.as_u16(),
            message: message.into(),
            data: None,
            errors,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
