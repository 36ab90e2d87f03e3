//! # Shelf API
//!
//! JSON REST server for the bookstore frontend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Request Flow                                  │
//! │                                                                         │
//! │  HTTP ──► TraceLayer ──► CorsLayer ──► /api router                     │
//! │                                          │                              │
//! │               ┌──────────────────────────┼──────────────────────┐       │
//! │               ▼                          ▼                      ▼       │
//! │        AuthUser / SuperUser        ApiJson / ApiPath       State<AppState>
//! │        (Bearer JWT → User)         (→ ApiError on bad input)    │       │
//! │               │                          │                      │       │
//! │               └──────────────► handler ◄─┘                      │       │
//! │                                   │                             │       │
//! │                                   ▼                             │       │
//! │                     shelf-db repositories / Checkout ◄──────────┘       │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                 Ok → JSON DTO     Err → ApiError → {"error": msg}       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `HTTP_HOST` / `HTTP_PORT` - bind address (default: 0.0.0.0:8000)
//! - `DATABASE_PATH` - SQLite file (default: shelf.db)
//! - `DB_MAX_CONNECTIONS` - pool size (default: 5)
//! - `DB_BUSY_TIMEOUT_MS` - writer wait on a locked database (default: 5000)
//! - `JWT_SECRET` - Secret for JWT signing
//! - `JWT_ACCESS_LIFETIME_SECS` - Access token lifetime (default: 86400)
//! - `STOCK_POLICY` - `strict` or `best_effort` (default: strict)

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Builds the application router.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
