//! Service configuration
//!
//! Defaults are overlaid with `ATTENDANCE_*` environment variables, e.g.
//! `ATTENDANCE_PORT=8080` or `ATTENDANCE_STORAGE=memory`. Database settings
//! are read separately by [`common::database::DatabaseConfig::from_env`].

use anyhow::Result;
use attendance::DenominatorPolicy;
use config::{Config, Environment};
use serde::Deserialize;

/// Where sessions and attendance are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL via `DATABASE_URL`
    Postgres,
    /// Process memory; everything is lost on restart
    Memory,
}

/// API service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Interface to bind (default: 0.0.0.0)
    pub host: String,
    /// Port to listen on (default: 3000)
    pub port: u16,
    /// Storage backend (default: postgres)
    pub storage: StorageBackend,
    /// Denominator used for attendance percentages (default: all_sessions)
    pub denominator: DenominatorPolicy,
}

impl AppConfig {
    /// Load the configuration from defaults and the environment
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000)?
            .set_default("storage", "postgres")?
            .set_default("denominator", "all_sessions")?
            .add_source(Environment::with_prefix("ATTENDANCE").try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Socket address to bind the listener to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
