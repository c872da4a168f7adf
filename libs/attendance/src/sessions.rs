//! Session store: creation, lookup, termination and listing

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::code::{CodeGenerator, RandomCodeGenerator, normalize_code};
use crate::error::{AttendanceError, AttendanceResult};
use crate::expiry;
use crate::models::{NewSession, Session};
use crate::repository::{AttendanceRepository, InsertOutcome};

/// How many fresh codes creation tries before giving up
pub const MAX_CODE_ATTEMPTS: u32 = 8;

/// Longest duration accepted at creation (one week)
pub const MAX_DURATION_MINUTES: i32 = 7 * 24 * 60;

/// Owns session records on top of the injected repository
#[derive(Clone)]
pub struct SessionStore {
    repository: Arc<dyn AttendanceRepository>,
    codes: Arc<dyn CodeGenerator>,
}

impl SessionStore {
    /// Create a store generating random codes
    pub fn new(repository: Arc<dyn AttendanceRepository>) -> Self {
        Self::with_code_generator(repository, Arc::new(RandomCodeGenerator))
    }

    /// Create a store drawing candidate codes from `codes`
    pub fn with_code_generator(
        repository: Arc<dyn AttendanceRepository>,
        codes: Arc<dyn CodeGenerator>,
    ) -> Self {
        Self { repository, codes }
    }

    /// Open a new session at `now`.
    ///
    /// Candidate codes are inserted conditionally; a conflict means the code
    /// is taken and another candidate is tried.
    pub async fn create(&self, new: NewSession, now: DateTime<Utc>) -> AttendanceResult<Session> {
        let subject = new.subject.trim();
        let room = new.room.trim();
        if subject.is_empty() {
            return Err(AttendanceError::validation("subject is required"));
        }
        if room.is_empty() {
            return Err(AttendanceError::validation("room is required"));
        }
        if let Some(minutes) = new.duration_minutes {
            if !(1..=MAX_DURATION_MINUTES).contains(&minutes) {
                return Err(AttendanceError::validation(format!(
                    "durationMinutes must be between 1 and {}",
                    MAX_DURATION_MINUTES
                )));
            }
        }
        if let Some(expires_at) = new.expires_at {
            if expires_at <= now {
                return Err(AttendanceError::validation(
                    "expiresAt must be later than the creation time",
                ));
            }
        }

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let session = Session {
                code: normalize_code(&self.codes.generate()),
                subject: subject.to_string(),
                room: room.to_string(),
                created_at: now,
                duration_minutes: new.duration_minutes,
                expires_at: new.expires_at,
                is_active: true,
                ended_at: None,
            };

            match self.repository.insert_session(&session).await? {
                InsertOutcome::Inserted => {
                    info!(
                        "Created session {} for {} in {} (expires {})",
                        session.code,
                        session.subject,
                        session.room,
                        expiry::effective_expiry(&session)
                    );
                    return Ok(session);
                }
                InsertOutcome::Conflict => {
                    warn!(
                        "Session code {} already in use (attempt {}/{})",
                        session.code, attempt, MAX_CODE_ATTEMPTS
                    );
                }
            }
        }

        Err(AttendanceError::CodeAllocation {
            attempts: MAX_CODE_ATTEMPTS,
        })
    }

    /// Look a session up by code, in any letter case
    pub async fn find_by_code(&self, code: &str) -> AttendanceResult<Session> {
        self.repository
            .find_session(&normalize_code(code))
            .await?
            .ok_or(AttendanceError::SessionNotFound)
    }

    /// End a session. Ending an ended session succeeds and keeps the
    /// original end time.
    pub async fn end(&self, code: &str, now: DateTime<Utc>) -> AttendanceResult<Session> {
        let session = self
            .repository
            .end_session(&normalize_code(code), now)
            .await?
            .ok_or(AttendanceError::SessionNotFound)?;

        info!("Ended session {}", session.code);
        Ok(session)
    }

    /// All sessions, newest first
    pub async fn list(&self) -> AttendanceResult<Vec<Session>> {
        Ok(self.repository.list_sessions().await?)
    }

    /// Sessions accepting registrations at `now`
    pub async fn list_active(&self, now: DateTime<Utc>) -> AttendanceResult<Vec<Session>> {
        let sessions = self.list().await?;
        Ok(sessions
            .into_iter()
            .filter(|session| expiry::validity(session, now).is_valid())
            .collect())
    }

    /// Total number of sessions ever created
    pub async fn count(&self) -> AttendanceResult<i64> {
        Ok(self.repository.count_sessions().await?)
    }
}
