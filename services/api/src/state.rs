//! Application state shared across handlers

use attendance::AttendanceService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: AttendanceService,
}

impl AppState {
    pub fn new(service: AttendanceService) -> Self {
        Self { service }
    }
}
