//! Session validity policy
//!
//! The only place where a session's effective expiry is derived. Callers pass
//! `now` explicitly; nothing here reads the clock.

use chrono::{DateTime, Duration, Utc};

use crate::error::{AttendanceError, AttendanceResult};
use crate::models::Session;

/// Window applied when a session carries neither `expires_at` nor a duration
pub const DEFAULT_SESSION_MINUTES: i64 = 60;

/// Resolve when `session` stops accepting registrations.
///
/// Priority: explicit `expires_at`, then `created_at + duration_minutes`,
/// then `created_at + 60 minutes`.
pub fn effective_expiry(session: &Session) -> DateTime<Utc> {
    if let Some(expires_at) = session.expires_at {
        return expires_at;
    }
    let minutes = session
        .duration_minutes
        .map(i64::from)
        .unwrap_or(DEFAULT_SESSION_MINUTES);
    session.created_at + Duration::minutes(minutes)
}

/// Instant after which `session` accepted no more registrations: its
/// `ended_at` when it was terminated before expiry, else its effective expiry.
pub fn closed_at(session: &Session) -> DateTime<Utc> {
    let expiry = effective_expiry(session);
    session.ended_at.map_or(expiry, |ended| ended.min(expiry))
}

/// Outcome of evaluating a session at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Accepting registrations for at least `remaining_minutes` more whole minutes
    Open { remaining_minutes: i64 },
    /// Explicitly terminated
    Ended,
    /// Past its effective expiry
    Expired,
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Open { .. })
    }

    pub fn remaining_minutes(&self) -> Option<i64> {
        match self {
            Validity::Open { remaining_minutes } => Some(*remaining_minutes),
            _ => None,
        }
    }

    /// Reject anything but an open session with the matching error.
    pub fn ensure_open(self) -> AttendanceResult<i64> {
        match self {
            Validity::Open { remaining_minutes } => Ok(remaining_minutes),
            Validity::Ended => Err(AttendanceError::SessionEnded),
            Validity::Expired => Err(AttendanceError::SessionExpired),
        }
    }
}

/// Evaluate `session` at `now`.
///
/// Explicit termination wins over the computed expiry. A session is still
/// open at exactly its expiry instant.
pub fn validity(session: &Session, now: DateTime<Utc>) -> Validity {
    if session.is_ended() {
        return Validity::Ended;
    }
    let expiry = effective_expiry(session);
    if now > expiry {
        return Validity::Expired;
    }
    Validity::Open {
        remaining_minutes: (expiry - now).num_minutes(),
    }
}
