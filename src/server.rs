//! HTTP server initialization and runtime setup.
//!
//! Handles the row store, the telemetry pipeline and the Axum server lifecycle.

use crate::application::telemetry_pipeline::TelemetryPipeline;
use crate::config::{Config, StorageBackend};
use crate::domain::repositories::ShortenedUrlRepository;
use crate::infrastructure::persistence::{InMemoryShortenedUrlRepository, PgShortenedUrlRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// Connects to PostgreSQL with the configured pool settings and applies
/// pending migrations.
///
/// # Errors
///
/// Returns an error if the connection or a migration fails.
pub async fn connect_database(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    Ok(pool)
}

/// Builds the row store selected by `STORAGE_BACKEND`.
///
/// # Errors
///
/// Returns an error if the database cannot be reached (PostgreSQL backend).
pub async fn build_repository(config: &Config) -> Result<Arc<dyn ShortenedUrlRepository>> {
    let repository: Arc<dyn ShortenedUrlRepository> = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = connect_database(config).await?;
            Arc::new(PgShortenedUrlRepository::new(Arc::new(pool)))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, rows are lost on restart");
            Arc::new(InMemoryShortenedUrlRepository::new())
        }
    };

    Ok(repository)
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Row store (PostgreSQL with migrations, or in-memory)
/// - Telemetry queue and hit aggregator
/// - Axum HTTP server
///
/// On Ctrl+C or SIGTERM the server stops accepting connections, finishes
/// in-flight requests, then stops the aggregator within the configured
/// grace period.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let repository = build_repository(&config).await?;

    let pipeline = TelemetryPipeline::start(repository, config.telemetry_settings());

    let state = AppState::new(
        pipeline.service.clone(),
        config.base_url.clone(),
        pipeline.aggregator.subscribe(),
    );

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped, shutting down hit aggregator");
    pipeline.aggregator.shutdown(config.shutdown_grace()).await;

    Ok(())
}

/// Completes on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
