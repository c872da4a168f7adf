//! Session model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One time-boxed attendance window for a subject/room.
///
/// `code` is stored upper-cased; see [`crate::code::normalize_code`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub code: String,
    pub subject: String,
    pub room: String,
    pub created_at: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Whether an instructor explicitly terminated this session.
    pub fn is_ended(&self) -> bool {
        !self.is_active || self.ended_at.is_some()
    }
}

/// New session creation payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub subject: String,
    pub room: String,
    pub duration_minutes: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}
