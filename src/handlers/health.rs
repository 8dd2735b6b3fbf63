use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::AppState;

/// Liveness plus a cheap store round-trip; 503 while the store is unreachable.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and store are reachable"),
        (status = 503, description = "Store unavailable")
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match state.store.find_default_project().await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ok", "store": "up" }))),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the store");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "store": "down" })),
            )
        }
    }
}
