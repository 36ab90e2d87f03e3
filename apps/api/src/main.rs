//! # Shelf API server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Browser ───► HTTP (8000) ───► axum routes ───► shelf-db ───► SQLite   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use shelf_api::{build_app, ApiConfig, AppState};
use shelf_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("shelf_api=info,shelf_db=info,tower_http=info")
        }))
        .with_target(true)
        .init();

    info!("Starting Shelf API server...");

    // Load configuration
    let config = ApiConfig::load()?;
    info!(
        addr = %config.bind_address(),
        database = %config.database_path,
        stock_policy = %config.stock_policy,
        "Configuration loaded"
    );
    if config.uses_dev_secret() {
        warn!("JWT_SECRET not set, signing tokens with the development secret");
    }

    // Open database (migrations run on connect)
    let db = Database::new(
        DbConfig::new(&config.database_path)
            .max_connections(config.db_max_connections)
            .busy_timeout(config.db_busy_timeout),
    )
    .await
    .context("opening database")?;

    let addr = config.bind_address();
    let state = Arc::new(AppState::new(db.clone(), config));
    let app = build_app(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
