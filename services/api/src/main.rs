use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod models;
mod routes;
mod state;

use attendance::{AttendanceRepository, AttendanceService, MemoryRepository, PostgresRepository};
use common::database::{DatabaseConfig, init_pool};
use tokio::net::TcpListener;

use crate::{
    config::{AppConfig, StorageBackend},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting attendance API service");

    let config = AppConfig::load()?;

    let repository: Arc<dyn AttendanceRepository> = match config.storage {
        StorageBackend::Postgres => {
            // Initialize database connection pool
            let db_config = DatabaseConfig::from_env()?;
            let pool = init_pool(&db_config).await?;

            // Check database connectivity
            if common::database::health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }

            let repository = PostgresRepository::new(pool);
            repository.ensure_schema().await?;
            Arc::new(repository)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; sessions and attendance are lost on restart");
            Arc::new(MemoryRepository::new())
        }
    };

    let service = AttendanceService::new(repository, config.denominator);
    info!(
        "Attendance service initialized ({} storage, {:?} denominator)",
        service.backend(),
        service.denominator_policy()
    );

    // Start the web server
    let app = routes::create_router(AppState::new(service));

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Attendance API listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Attendance API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down attendance API service");
}
