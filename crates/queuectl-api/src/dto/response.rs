//! Response DTOs.

use serde::{Deserialize, Serialize};

use queuectl_entity::metric::{Metric, MetricBucket};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status (`ok` or `degraded`).
    pub status: String,
    /// Store reachability (`connected` or `unavailable`).
    pub store: String,
    /// Crate version.
    pub version: String,
}

/// Metric series, either raw or bucketed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricsPayload {
    /// Raw points, oldest first.
    Points(Vec<Metric>),
    /// Fixed-width aggregates, oldest first.
    Buckets(Vec<MetricBucket>),
}
