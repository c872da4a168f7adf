//! In-process repository
//!
//! All state sits behind one `RwLock`. Readers share the lock and always see
//! a state between two whole writes; the write guard is the critical section
//! for conditional inserts.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use tokio::sync::RwLock;

use super::{AttendanceRepository, InsertOutcome, PercentageInputs};
use crate::models::{AttendanceRecord, Session, Student};

#[derive(Debug, Default)]
struct MemoryState {
    sessions: HashMap<String, Session>,
    students: HashMap<String, Student>,
    attendance: Vec<AttendanceRecord>,
    registered: HashSet<(String, String)>,
}

/// Repository keeping everything in memory for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: RwLock<MemoryState>,
}

impl MemoryState {
    fn sessions_newest_first(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.code.cmp(&b.code))
        });
        sessions
    }

    fn students_by_id(&self) -> Vec<Student> {
        let mut students: Vec<Student> = self.students.values().cloned().collect();
        students.sort_by(|a, b| a.student_id.cmp(&b.student_id));
        students
    }

    fn attended_counts(&self) -> HashMap<String, i64> {
        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        let mut counts: HashMap<String, i64> = HashMap::new();
        for record in &self.attendance {
            if seen.insert((record.student_id.as_str(), record.session_code.as_str())) {
                *counts.entry(record.student_id.clone()).or_default() += 1;
            }
        }
        counts
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttendanceRepository for MemoryRepository {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert_session(&self, session: &Session) -> DatabaseResult<InsertOutcome> {
        let mut state = self.state.write().await;
        if state.sessions.contains_key(&session.code) {
            return Ok(InsertOutcome::Conflict);
        }
        state.sessions.insert(session.code.clone(), session.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn find_session(&self, code: &str) -> DatabaseResult<Option<Session>> {
        Ok(self.state.read().await.sessions.get(code).cloned())
    }

    async fn end_session(
        &self,
        code: &str,
        ended_at: DateTime<Utc>,
    ) -> DatabaseResult<Option<Session>> {
        let mut state = self.state.write().await;
        let Some(session) = state.sessions.get_mut(code) else {
            return Ok(None);
        };
        session.is_active = false;
        if session.ended_at.is_none() {
            session.ended_at = Some(ended_at);
        }
        Ok(Some(session.clone()))
    }

    async fn list_sessions(&self) -> DatabaseResult<Vec<Session>> {
        Ok(self.state.read().await.sessions_newest_first())
    }

    async fn count_sessions(&self) -> DatabaseResult<i64> {
        Ok(self.state.read().await.sessions.len() as i64)
    }

    async fn record_attendance(&self, record: &AttendanceRecord) -> DatabaseResult<InsertOutcome> {
        let mut state = self.state.write().await;
        let key = (record.student_id.clone(), record.session_code.clone());
        if !state.registered.insert(key) {
            return Ok(InsertOutcome::Conflict);
        }
        state
            .students
            .entry(record.student_id.clone())
            .or_insert_with(|| record.as_student());
        state.attendance.push(record.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn session_attendance(&self, code: &str) -> DatabaseResult<Vec<AttendanceRecord>> {
        let state = self.state.read().await;
        // Appends happen in registration order, so the vector is already sorted.
        Ok(state
            .attendance
            .iter()
            .filter(|record| record.session_code == code)
            .cloned()
            .collect())
    }

    async fn percentage_inputs(&self) -> DatabaseResult<PercentageInputs> {
        let state = self.state.read().await;
        Ok(PercentageInputs {
            students: state.students_by_id(),
            attended: state.attended_counts(),
            sessions: state.sessions_newest_first(),
        })
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        Ok(true)
    }
}
