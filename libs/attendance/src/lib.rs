//! Session lifecycle and attendance registration engine
//!
//! An instructor opens a time-boxed session; students register presence
//! against its code at most once. The crate decides whether a session is
//! currently valid, records registrations atomically, and reports each
//! student's attendance ratio. Storage is injected through
//! [`repository::AttendanceRepository`].
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use attendance::{AttendanceService, DenominatorPolicy, MemoryRepository, NewSession};
//! use chrono::Utc;
//!
//! # async fn demo() -> Result<(), attendance::AttendanceError> {
//! let service = AttendanceService::new(
//!     Arc::new(MemoryRepository::new()),
//!     DenominatorPolicy::AllSessions,
//! );
//! let session = service
//!     .create_session(
//!         NewSession {
//!             subject: "Compilers".into(),
//!             room: "B204".into(),
//!             duration_minutes: Some(15),
//!             expires_at: None,
//!         },
//!         Utc::now(),
//!     )
//!     .await?;
//! service
//!     .register_attendance("20231234", "Yusuf", &session.code, Utc::now())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod code;
pub mod error;
pub mod expiry;
pub mod ledger;
pub mod models;
pub mod percentages;
pub mod repository;
pub mod service;
pub mod sessions;

pub use error::{AttendanceError, AttendanceResult};
pub use models::{AttendanceRecord, NewSession, Session, Student};
pub use percentages::{DenominatorPolicy, StudentPercentage};
pub use repository::{AttendanceRepository, MemoryRepository, PostgresRepository};
pub use service::{AttendanceService, CheckReason, SessionCheck, SessionState, SessionSummary};
