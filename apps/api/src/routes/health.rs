//! Liveness endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// `GET /api/health`: 200 when the database answers, 503 otherwise.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    if state.db.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok", "database": "ok" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": "unreachable" })),
        )
    }
}
