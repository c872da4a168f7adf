//! Attendance ledger
//!
//! Append-only. The duplicate check and the append are a single conditional
//! insert in the repository, never a read followed by a separate write.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::{AttendanceError, AttendanceResult};
use crate::expiry;
use crate::models::AttendanceRecord;
use crate::repository::{AttendanceRepository, InsertOutcome};
use crate::sessions::SessionStore;

/// Records presence against open sessions, at most once per student and session
#[derive(Clone)]
pub struct AttendanceLedger {
    sessions: SessionStore,
    repository: Arc<dyn AttendanceRepository>,
}

impl AttendanceLedger {
    pub fn new(sessions: SessionStore, repository: Arc<dyn AttendanceRepository>) -> Self {
        Self {
            sessions,
            repository,
        }
    }

    /// Register `student_id` as present in `session_code` at `now`.
    ///
    /// The student joins the roster on first registration; a different name
    /// sent later under the same id does not rename them.
    pub async fn register(
        &self,
        student_id: &str,
        name: &str,
        session_code: &str,
        now: DateTime<Utc>,
    ) -> AttendanceResult<AttendanceRecord> {
        let student_id = student_id.trim();
        let name = name.trim();
        if student_id.is_empty() {
            return Err(AttendanceError::validation("studentId is required"));
        }
        if name.is_empty() {
            return Err(AttendanceError::validation("name is required"));
        }
        if session_code.trim().is_empty() {
            return Err(AttendanceError::validation("sessionCode is required"));
        }

        let session = self.sessions.find_by_code(session_code).await?;
        if let Err(err) = expiry::validity(&session, now).ensure_open() {
            warn!(
                "Rejected registration of {} for session {}: {}",
                student_id, session.code, err
            );
            return Err(err);
        }

        let record = AttendanceRecord {
            student_id: student_id.to_string(),
            name: name.to_string(),
            session_code: session.code,
            timestamp: now,
        };

        match self.repository.record_attendance(&record).await? {
            InsertOutcome::Inserted => {
                info!(
                    "Registered {} for session {}",
                    record.student_id, record.session_code
                );
                Ok(record)
            }
            InsertOutcome::Conflict => {
                warn!(
                    "Duplicate registration of {} for session {}",
                    record.student_id, record.session_code
                );
                Err(AttendanceError::DuplicateRegistration)
            }
        }
    }

    /// Everyone registered for a session, in registration order
    pub async fn session_attendance(
        &self,
        session_code: &str,
    ) -> AttendanceResult<Vec<AttendanceRecord>> {
        let session = self.sessions.find_by_code(session_code).await?;
        Ok(self
            .repository
            .session_attendance(&session.code)
            .await?)
    }
}
