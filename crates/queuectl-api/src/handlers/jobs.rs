//! Job listing handler.

use axum::Json;
use axum::extract::{Query, State};

use queuectl_entity::job::Job;

use crate::dto::request::JobsQuery;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/jobs?state=S
///
/// Newest first, capped at `dashboard.max_jobs`.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobsQuery>,
) -> Result<Json<ApiResponse<Vec<Job>>>, ApiError> {
    let mut jobs = state.queue.list(query.state.as_deref()).await?;
    jobs.truncate(state.config.max_jobs);
    Ok(Json(ApiResponse::ok(jobs)))
}
