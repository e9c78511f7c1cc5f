//! Health check handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use clothes_catalog_core::ConnectionLifecycle;

use crate::state::AppState;

/// Process liveness. Does not touch the store.
pub async fn live() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

/// Store readiness: 200 if the store answers a ping, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    match state.store().ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}
