//! Error taxonomy for the attendance core

use common::error::DatabaseError;
use thiserror::Error;

/// Every way an attendance operation can fail.
///
/// All variants except [`AttendanceError::StorageUnavailable`] and
/// [`AttendanceError::CodeAllocation`] are expected, user-facing outcomes.
#[derive(Error, Debug)]
pub enum AttendanceError {
    /// A required field was missing, empty or out of range
    #[error("Validation error: {0}")]
    Validation(String),

    /// No session exists for the given code
    #[error("Session not found")]
    SessionNotFound,

    /// The session was explicitly ended by its instructor
    #[error("Session has been ended")]
    SessionEnded,

    /// The session's effective expiry has passed
    #[error("Session has expired")]
    SessionExpired,

    /// The student already registered for this session
    #[error("Attendance already registered for this session")]
    DuplicateRegistration,

    /// No unused session code was found within the retry budget
    #[error("Could not allocate a unique session code after {attempts} attempts")]
    CodeAllocation { attempts: u32 },

    /// The storage collaborator failed
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] DatabaseError),
}

impl AttendanceError {
    /// Stable machine-readable name for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            AttendanceError::Validation(_) => "validation_error",
            AttendanceError::SessionNotFound => "session_not_found",
            AttendanceError::SessionEnded => "session_ended",
            AttendanceError::SessionExpired => "session_expired",
            AttendanceError::DuplicateRegistration => "duplicate_registration",
            AttendanceError::CodeAllocation { .. } => "code_allocation_failed",
            AttendanceError::StorageUnavailable(_) => "storage_unavailable",
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        AttendanceError::Validation(msg.into())
    }
}

/// Type alias for attendance results
pub type AttendanceResult<T> = Result<T, AttendanceError>;
