//! API models for request and response payloads

use attendance::{AttendanceRecord, NewSession, SessionSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request for session creation
///
/// Missing text fields default to empty so the core reports them as
/// validation errors.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub room: String,
    #[serde(default, alias = "duration")]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<CreateSessionRequest> for NewSession {
    fn from(request: CreateSessionRequest) -> Self {
        NewSession {
            subject: request.subject,
            room: request.room,
            duration_minutes: request.duration_minutes,
            expires_at: request.expires_at,
        }
    }
}

/// Response for session creation
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub message: String,
    pub code: String,
    pub session: SessionSummary,
}

/// Response for session termination
#[derive(Debug, Serialize)]
pub struct EndSessionResponse {
    pub ok: bool,
    pub message: String,
    pub session: SessionSummary,
}

/// Request for attendance registration
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAttendanceRequest {
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub session_code: String,
}

/// Response for attendance registration
#[derive(Debug, Serialize)]
pub struct RegisterAttendanceResponse {
    pub ok: bool,
    pub message: String,
    pub record: AttendanceRecord,
}
