//! Operation contracts consumed by the request layer
//!
//! [`AttendanceService`] wires the session store, the ledger and the
//! aggregator over one repository. Every operation takes `now` explicitly.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::code::CodeGenerator;
use crate::error::{AttendanceError, AttendanceResult};
use crate::expiry::{self, Validity};
use crate::ledger::AttendanceLedger;
use crate::models::{AttendanceRecord, NewSession, Session};
use crate::percentages::{DenominatorPolicy, PercentageAggregator, StudentPercentage};
use crate::repository::AttendanceRepository;
use crate::sessions::SessionStore;

/// Session state as shown to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Open,
    Ended,
    Expired,
}

/// A session together with its state evaluated at query time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub code: String,
    pub subject: String,
    pub room: String,
    pub created_at: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    pub expires_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_minutes: Option<i64>,
}

impl SessionSummary {
    pub fn at(session: &Session, now: DateTime<Utc>) -> Self {
        let validity = expiry::validity(session, now);
        let state = match validity {
            Validity::Open { .. } => SessionState::Open,
            Validity::Ended => SessionState::Ended,
            Validity::Expired => SessionState::Expired,
        };
        Self {
            code: session.code.clone(),
            subject: session.subject.clone(),
            room: session.room.clone(),
            created_at: session.created_at,
            duration_minutes: session.duration_minutes,
            expires_at: expiry::effective_expiry(session),
            ended_at: session.ended_at,
            state,
            remaining_minutes: validity.remaining_minutes(),
        }
    }
}

/// Why a session check came back invalid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckReason {
    NotFound,
    Ended,
    Expired,
}

/// Answer to "can students register against this code right now?"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<CheckReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionSummary>,
}

impl SessionCheck {
    fn invalid(reason: CheckReason) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
            session: None,
        }
    }
}

/// Entry point for request handlers: sessions, registrations and reports over one repository
#[derive(Clone)]
pub struct AttendanceService {
    repository: Arc<dyn AttendanceRepository>,
    sessions: SessionStore,
    ledger: AttendanceLedger,
    aggregator: PercentageAggregator,
}

impl AttendanceService {
    pub fn new(repository: Arc<dyn AttendanceRepository>, policy: DenominatorPolicy) -> Self {
        let sessions = SessionStore::new(repository.clone());
        Self::assemble(repository, sessions, policy)
    }

    pub fn with_code_generator(
        repository: Arc<dyn AttendanceRepository>,
        codes: Arc<dyn CodeGenerator>,
        policy: DenominatorPolicy,
    ) -> Self {
        let sessions = SessionStore::with_code_generator(repository.clone(), codes);
        Self::assemble(repository, sessions, policy)
    }

    fn assemble(
        repository: Arc<dyn AttendanceRepository>,
        sessions: SessionStore,
        policy: DenominatorPolicy,
    ) -> Self {
        let ledger = AttendanceLedger::new(sessions.clone(), repository.clone());
        let aggregator = PercentageAggregator::new(repository.clone(), policy);
        Self {
            repository,
            sessions,
            ledger,
            aggregator,
        }
    }

    pub fn backend(&self) -> &'static str {
        self.repository.backend()
    }

    pub fn denominator_policy(&self) -> DenominatorPolicy {
        self.aggregator.policy()
    }

    pub async fn create_session(
        &self,
        request: NewSession,
        now: DateTime<Utc>,
    ) -> AttendanceResult<Session> {
        self.sessions.create(request, now).await
    }

    /// Not-found is reported as an invalid check, not an error; only storage
    /// failures come back as `Err`.
    pub async fn check_session(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> AttendanceResult<SessionCheck> {
        let session = match self.sessions.find_by_code(code).await {
            Ok(session) => session,
            Err(AttendanceError::SessionNotFound) => {
                return Ok(SessionCheck::invalid(CheckReason::NotFound));
            }
            Err(err) => return Err(err),
        };

        let check = match expiry::validity(&session, now) {
            Validity::Open { .. } => SessionCheck {
                valid: true,
                reason: None,
                session: Some(SessionSummary::at(&session, now)),
            },
            Validity::Ended => SessionCheck::invalid(CheckReason::Ended),
            Validity::Expired => SessionCheck::invalid(CheckReason::Expired),
        };
        Ok(check)
    }

    pub async fn register_attendance(
        &self,
        student_id: &str,
        name: &str,
        session_code: &str,
        now: DateTime<Utc>,
    ) -> AttendanceResult<AttendanceRecord> {
        self.ledger
            .register(student_id, name, session_code, now)
            .await
    }

    pub async fn end_session(&self, code: &str, now: DateTime<Utc>) -> AttendanceResult<Session> {
        self.sessions.end(code, now).await
    }

    pub async fn list_sessions(&self, now: DateTime<Utc>) -> AttendanceResult<Vec<SessionSummary>> {
        let sessions = self.sessions.list().await?;
        Ok(sessions
            .iter()
            .map(|session| SessionSummary::at(session, now))
            .collect())
    }

    pub async fn list_active_sessions(
        &self,
        now: DateTime<Utc>,
    ) -> AttendanceResult<Vec<SessionSummary>> {
        let sessions = self.sessions.list_active(now).await?;
        Ok(sessions
            .iter()
            .map(|session| SessionSummary::at(session, now))
            .collect())
    }

    pub async fn session_attendance(&self, code: &str) -> AttendanceResult<Vec<AttendanceRecord>> {
        self.ledger.session_attendance(code).await
    }

    pub async fn attendance_percentages(&self) -> AttendanceResult<Vec<StudentPercentage>> {
        self.aggregator.percentages().await
    }

    pub async fn health_check(&self) -> AttendanceResult<bool> {
        Ok(self.repository.health_check().await?)
    }
}
