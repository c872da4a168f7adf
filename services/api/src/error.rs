//! Custom error types for the API service

use attendance::AttendanceError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Failure reported by the attendance core
    #[error(transparent)]
    Attendance(#[from] AttendanceError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Attendance(err) => match err {
                AttendanceError::Validation(_) => StatusCode::BAD_REQUEST,
                AttendanceError::SessionNotFound => StatusCode::NOT_FOUND,
                AttendanceError::SessionEnded | AttendanceError::SessionExpired => {
                    StatusCode::BAD_REQUEST
                }
                AttendanceError::DuplicateRegistration => StatusCode::CONFLICT,
                AttendanceError::CodeAllocation { .. }
                | AttendanceError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Attendance(err) => err.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Service temporarily unavailable".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": error_message,
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
