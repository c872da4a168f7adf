//! Student model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Student roster entry, created lazily on first successful registration.
///
/// Identity is the external `student_id`; `created_at` is the time of that
/// first registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub student_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
