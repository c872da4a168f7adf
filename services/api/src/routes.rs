//! API service routes

use attendance::{CheckReason, SessionSummary};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info};

use crate::{
    error::ApiResult,
    models::{
        CreateSessionRequest, CreateSessionResponse, EndSessionResponse,
        RegisterAttendanceRequest, RegisterAttendanceResponse,
    },
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/create", post(create_session))
        .route("/api/sessions/active", get(list_active_sessions))
        .route("/api/sessions/check/:code", get(check_session))
        .route("/api/sessions/end/:code", post(end_session))
        .route("/api/attendance/register", post(register_attendance))
        .route("/api/attendance/session/:code", get(session_attendance))
        .route("/api/attendance/percentages", get(attendance_percentages))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage_ok = match state.service.health_check().await {
        Ok(ok) => ok,
        Err(e) => {
            error!("Storage health check failed: {}", e);
            false
        }
    };

    let (status, label) = if storage_ok {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": "attendance-api",
            "storage": state.service.backend(),
        })),
    )
}

/// Open a new attendance session
pub async fn create_session(
    State(state): State<AppState>,
    Json(payload): Json<CreateSessionRequest>,
) -> ApiResult<impl IntoResponse> {
    let now = Utc::now();
    let session = state.service.create_session(payload.into(), now).await?;

    let response = CreateSessionResponse {
        message: "Session created".to_string(),
        code: session.code.clone(),
        session: SessionSummary::at(&session, now),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Check whether a session currently accepts registrations
pub async fn check_session(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let check = state.service.check_session(&code, Utc::now()).await?;

    let status = match check.reason {
        None => StatusCode::OK,
        Some(CheckReason::NotFound) => StatusCode::NOT_FOUND,
        Some(CheckReason::Ended | CheckReason::Expired) => StatusCode::BAD_REQUEST,
    };

    Ok((status, Json(check)))
}

/// End a session ahead of its expiry
pub async fn end_session(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let now = Utc::now();
    let session = state.service.end_session(&code, now).await?;

    Ok(Json(EndSessionResponse {
        ok: true,
        message: "Session ended".to_string(),
        session: SessionSummary::at(&session, now),
    }))
}

/// List every session, newest first
pub async fn list_sessions(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let sessions = state.service.list_sessions(Utc::now()).await?;
    Ok(Json(sessions))
}

/// List sessions currently accepting registrations
pub async fn list_active_sessions(
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let sessions = state.service.list_active_sessions(Utc::now()).await?;
    Ok(Json(sessions))
}

/// Register a student's presence in a session
pub async fn register_attendance(
    State(state): State<AppState>,
    Json(payload): Json<RegisterAttendanceRequest>,
) -> ApiResult<impl IntoResponse> {
    info!(
        "Attendance registration for {} in {}",
        payload.student_id, payload.session_code
    );

    let record = state
        .service
        .register_attendance(
            &payload.student_id,
            &payload.name,
            &payload.session_code,
            Utc::now(),
        )
        .await?;

    Ok(Json(RegisterAttendanceResponse {
        ok: true,
        message: "Attendance registered".to_string(),
        record,
    }))
}

/// Everyone registered for a session
pub async fn session_attendance(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let records = state.service.session_attendance(&code).await?;
    Ok(Json(records))
}

/// Attendance percentage per student
pub async fn attendance_percentages(
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let rows = state.service.attendance_percentages().await?;
    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendance::{AttendanceService, DenominatorPolicy, MemoryRepository};
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request},
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let service = AttendanceService::new(
            Arc::new(MemoryRepository::new()),
            DenominatorPolicy::AllSessions,
        );
        create_router(AppState::new(service))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(app: &Router, duration: i64) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/sessions/create",
            Some(json!({"subject": "Networks", "room": "B12", "durationMinutes": duration})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["code"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_reports_memory_backend() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["storage"], "memory");
    }

    #[tokio::test]
    async fn create_requires_subject_and_room() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/sessions/create",
            Some(json!({"room": "B12"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
    }

    #[tokio::test]
    async fn create_accepts_legacy_duration_field() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/sessions/create",
            Some(json!({"subject": "Networks", "room": "B12", "duration": 25})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["session"]["durationMinutes"], 25);
        assert_eq!(body["session"]["state"], "open");
    }

    #[tokio::test]
    async fn check_uses_any_case_and_reports_not_found() {
        let app = app();
        let code = create(&app, 30).await;

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/sessions/check/{}", code.to_lowercase()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], true);
        assert_eq!(body["session"]["code"], code.as_str());
        assert!(body["session"]["remainingMinutes"].as_i64().unwrap() >= 29);

        let (status, body) = send(&app, Method::GET, "/api/sessions/check/SNOPE00", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["valid"], false);
        assert_eq!(body["reason"], "not_found");
        assert!(body.get("session").is_none());
    }

    #[tokio::test]
    async fn register_then_duplicate_then_percentages() {
        let app = app();
        let code = create(&app, 30).await;
        create(&app, 30).await;

        let payload = json!({"studentId": "2024001", "name": "Lina", "sessionCode": code});
        let (status, body) =
            send(&app, Method::POST, "/api/attendance/register", Some(payload.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);

        let (status, body) =
            send(&app, Method::POST, "/api/attendance/register", Some(payload)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "duplicate_registration");

        let (status, body) = send(&app, Method::GET, "/api/attendance/percentages", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{
                "studentId": "2024001",
                "name": "Lina",
                "attended": 1,
                "total": 2,
                "percentage": 50.0
            }])
        );

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/attendance/session/{}", code),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn register_with_missing_fields_is_rejected() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/attendance/register",
            Some(json!({"name": "Lina"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
    }

    #[tokio::test]
    async fn ended_session_rejects_registration_and_leaves_active_list() {
        let app = app();
        let code = create(&app, 60).await;

        let (status, body) =
            send(&app, Method::POST, &format!("/api/sessions/end/{}", code), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["state"], "ended");

        // Ending twice is fine.
        let (status, _) =
            send(&app, Method::POST, &format!("/api/sessions/end/{}", code), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/attendance/register",
            Some(json!({"studentId": "1", "name": "Ali", "sessionCode": code})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "session_ended");

        let check_uri = format!("/api/sessions/check/{}", code);
        let (_, body) = send(&app, Method::GET, &check_uri, None).await;
        assert_eq!(body["reason"], "ended");

        let (_, active) = send(&app, Method::GET, "/api/sessions/active", None).await;
        assert_eq!(active, json!([]));
        let (_, all) = send(&app, Method::GET, "/api/sessions", None).await;
        assert_eq!(all.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn end_unknown_session_is_not_found() {
        let app = app();
        let (status, body) = send(&app, Method::POST, "/api/sessions/end/SNOPE00", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "session_not_found");
    }
}
