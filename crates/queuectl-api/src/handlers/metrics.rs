//! Metric series handler.

use axum::Json;
use axum::extract::{Query, State};

use crate::dto::request::MetricsQuery;
use crate::dto::response::{ApiResponse, MetricsPayload};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/metrics?type=T&hours=H&bucket_minutes=M
pub async fn metrics(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<ApiResponse<MetricsPayload>>, ApiError> {
    let payload = match query.bucket_minutes {
        Some(minutes) => MetricsPayload::Buckets(
            state
                .queue
                .metric_buckets(query.metric_type(), query.hours(), minutes)
                .await?,
        ),
        None => MetricsPayload::Points(
            state
                .queue
                .metric_series(query.metric_type(), query.hours())
                .await?,
        ),
    };
    Ok(Json(ApiResponse::ok(payload)))
}
