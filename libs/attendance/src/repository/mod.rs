//! Storage seam for sessions, students and attendance
//!
//! The core never touches storage directly; it is handed an
//! [`AttendanceRepository`] at construction time. Codes reaching the
//! repository are already normalised.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;

use crate::models::{AttendanceRecord, Session, Student};

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

/// Result of a conditional insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was written
    Inserted,
    /// A row with the same unique key already existed; nothing was written
    Conflict,
}

/// Roster, per-student counts and sessions as seen at one instant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PercentageInputs {
    /// Roster ordered by student id
    pub students: Vec<Student>,
    /// Distinct sessions attended, keyed by student id
    pub attended: HashMap<String, i64>,
    /// Every session, newest first
    pub sessions: Vec<Session>,
}

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// Short tag identifying the backend in logs and health reports
    fn backend(&self) -> &'static str;

    /// Insert `session` unless its code is already taken.
    async fn insert_session(&self, session: &Session) -> DatabaseResult<InsertOutcome>;

    async fn find_session(&self, code: &str) -> DatabaseResult<Option<Session>>;

    /// Mark a session ended. An existing `ended_at` is kept as is.
    async fn end_session(
        &self,
        code: &str,
        ended_at: DateTime<Utc>,
    ) -> DatabaseResult<Option<Session>>;

    /// All sessions, newest first
    async fn list_sessions(&self) -> DatabaseResult<Vec<Session>>;

    /// Number of sessions ever created
    async fn count_sessions(&self) -> DatabaseResult<i64>;

    /// Append `record` unless one already exists for its
    /// `(student_id, session_code)`, adding the student to the roster if the
    /// id is unseen. The uniqueness check, the roster insert and the append
    /// happen as one atomic unit.
    async fn record_attendance(&self, record: &AttendanceRecord) -> DatabaseResult<InsertOutcome>;

    /// Attendance for one session, oldest first
    async fn session_attendance(&self, code: &str) -> DatabaseResult<Vec<AttendanceRecord>>;

    /// Everything a percentage report reads, taken from one consistent
    /// snapshot so a session created mid-report cannot skew the totals.
    async fn percentage_inputs(&self) -> DatabaseResult<PercentageInputs>;

    async fn health_check(&self) -> DatabaseResult<bool>;
}
