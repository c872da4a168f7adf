//! Attendance percentages per student
//!
//! The denominator is evaluated when the query runs. Under the default
//! [`DenominatorPolicy::AllSessions`] a student's percentage drops as new
//! sessions are created even if their attendance count stays the same.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AttendanceResult;
use crate::expiry;
use crate::models::{Session, Student};
use crate::repository::{AttendanceRepository, PercentageInputs};

/// Which sessions count towards a student's total
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenominatorPolicy {
    /// Every session ever created
    #[default]
    AllSessions,
    /// Sessions not yet closed, by expiry or by ending, at the student's
    /// first registration
    SinceEnrollment,
}

/// One row of the percentage report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPercentage {
    pub student_id: String,
    pub name: String,
    pub attended: i64,
    pub total: i64,
    pub percentage: f64,
}

/// `attended / total` as a percentage rounded to one decimal.
/// A zero total is treated as one.
pub fn percentage(attended: i64, total: i64) -> f64 {
    let denominator = total.max(1) as f64;
    (attended as f64 / denominator * 1000.0).round() / 10.0
}

/// Fold roster and per-student counts against a fixed total.
pub fn against_total(
    students: &[Student],
    attended: &HashMap<String, i64>,
    total: i64,
) -> Vec<StudentPercentage> {
    students
        .iter()
        .map(|student| row(student, attended, total))
        .collect()
}

/// Fold roster and per-student counts, counting for each student only the
/// sessions that closed at or after they enrolled. A session closes at the
/// earlier of its `ended_at` and its effective expiry.
///
/// A registration can only land while its session is open, so every session
/// a student attended is part of their own denominator.
pub fn since_enrollment(
    students: &[Student],
    attended: &HashMap<String, i64>,
    sessions: &[Session],
) -> Vec<StudentPercentage> {
    let mut closings: Vec<_> = sessions.iter().map(expiry::closed_at).collect();
    closings.sort_unstable();

    students
        .iter()
        .map(|student| {
            let closed_before = closings.partition_point(|at| *at < student.created_at);
            let total = (closings.len() - closed_before) as i64;
            row(student, attended, total)
        })
        .collect()
}

fn row(student: &Student, attended: &HashMap<String, i64>, total: i64) -> StudentPercentage {
    let count = attended.get(&student.student_id).copied().unwrap_or(0);
    StudentPercentage {
        student_id: student.student_id.clone(),
        name: student.name.clone(),
        attended: count,
        total,
        percentage: percentage(count, total),
    }
}

/// Reads sessions, roster and counts in one snapshot and folds them into a report
#[derive(Clone)]
pub struct PercentageAggregator {
    repository: Arc<dyn AttendanceRepository>,
    policy: DenominatorPolicy,
}

impl PercentageAggregator {
    pub fn new(repository: Arc<dyn AttendanceRepository>, policy: DenominatorPolicy) -> Self {
        Self { repository, policy }
    }

    pub fn policy(&self) -> DenominatorPolicy {
        self.policy
    }

    /// Percentages for every student on the roster, ordered by student id
    pub async fn percentages(&self) -> AttendanceResult<Vec<StudentPercentage>> {
        let PercentageInputs {
            students,
            attended,
            sessions,
        } = self.repository.percentage_inputs().await?;

        let rows = match self.policy {
            DenominatorPolicy::AllSessions => {
                let total = sessions.len() as i64;
                debug!("Computing percentages against {} sessions", total);
                against_total(&students, &attended, total)
            }
            DenominatorPolicy::SinceEnrollment => since_enrollment(&students, &attended, &sessions),
        };

        Ok(rows)
    }
}
