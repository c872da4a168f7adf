//! Attendance domain models

pub mod attendance;
pub mod session;
pub mod student;

// Re-export for convenience
pub use attendance::AttendanceRecord;
pub use session::{NewSession, Session};
pub use student::Student;
