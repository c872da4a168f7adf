//! Attendance record model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Student;

/// One student's presence in one session. At most one exists per
/// `(student_id, session_code)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub student_id: String,
    pub name: String,
    pub session_code: String,
    #[sqlx(rename = "recorded_at")]
    pub timestamp: DateTime<Utc>,
}

impl AttendanceRecord {
    /// The roster entry to create if this is the student's first registration.
    pub fn as_student(&self) -> Student {
        Student {
            student_id: self.student_id.clone(),
            name: self.name.clone(),
            created_at: self.timestamp,
        }
    }
}
