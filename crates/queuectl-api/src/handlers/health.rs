//! Health check handler.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let reachable = state.queue.store().health_check().await.unwrap_or(false);

    Json(ApiResponse::ok(HealthResponse {
        status: if reachable { "ok" } else { "degraded" }.to_string(),
        store: if reachable { "connected" } else { "unavailable" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
