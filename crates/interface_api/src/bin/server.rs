//! Trade Claims Reconciliation - API Server Binary
//!
//! This binary starts the HTTP API server for the reconciliation engine.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin reconciliation-api
//!
//! # Run with environment variables
//! API_PORT=8080 API_DATABASE__URL=postgres://... cargo run --bin reconciliation-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `API_DATABASE__URL` - PostgreSQL connection string (falls back to `DATABASE_URL`)
//! * `API_DATABASE__MAX_CONNECTIONS` - Pool size (default: 10)
//! * `API_ENGINE__MAX_WRITE_ATTEMPTS` - Conflict retries per write (default: 5)
//! * `API_ENGINE__DEFAULT_SLA_HOURS` - SLA for approvals without one (default: 48)
//! * `API_ENGINE__REPORTING_TIMEZONE` - IANA zone for aging buckets (default: UTC)

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_reconciliation::ReconciliationEngine;
use infra_db::{
    create_pool, run_migrations, PostgresLedgerAdapter, PostgresStatusProjection,
    PROJECTED_ENTITY_TYPES,
};
use interface_api::{config::ApiConfig, create_router};

/// Main entry point for the API server.
///
/// Initializes logging, loads configuration, connects and migrates the
/// ledger database, and starts the HTTP server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = load_config()?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting reconciliation API server"
    );

    tracing::info!("Connecting to database...");
    let pool = create_pool(config.database.clone())
        .await
        .context("failed to connect to the ledger database")?;

    tracing::info!("Running database migrations...");
    run_migrations(&pool).await.context("failed to migrate the ledger database")?;

    let ledger = Arc::new(PostgresLedgerAdapter::new(pool.clone()));
    let projection = Arc::new(PostgresStatusProjection::new(pool));
    let mut engine = ReconciliationEngine::new(ledger, config.engine.clone());
    for entity_type in PROJECTED_ENTITY_TYPES {
        engine = engine.with_target(entity_type, projection.clone());
    }

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;
    let app = create_router(engine, config);

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Loads API configuration from environment variables.
///
/// `DATABASE_URL` is honoured when `API_DATABASE__URL` is not set.
fn load_config() -> anyhow::Result<ApiConfig> {
    let mut config = ApiConfig::from_env().context("invalid API_* configuration")?;

    if std::env::var("API_DATABASE__URL").is_err() {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }
    }

    Ok(config)
}

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
