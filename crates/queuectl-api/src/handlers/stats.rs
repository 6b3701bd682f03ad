//! Queue statistics handler.

use axum::Json;
use axum::extract::State;

use queuectl_entity::job::QueueStats;

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<ApiResponse<QueueStats>>, ApiError> {
    let stats = state.queue.stats().await?;
    Ok(Json(ApiResponse::ok(stats)))
}
