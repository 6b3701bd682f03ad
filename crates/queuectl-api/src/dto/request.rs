//! Query-string DTOs.

use serde::{Deserialize, Serialize};

/// `GET /api/jobs` query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobsQuery {
    /// Optional state filter (case-insensitive).
    pub state: Option<String>,
}

/// `GET /api/metrics` query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsQuery {
    /// Metric series name.
    #[serde(rename = "type")]
    pub metric_type: Option<String>,
    /// Lookback window in hours.
    pub hours: Option<i64>,
    /// Bucket width in minutes; raw points are returned when absent.
    pub bucket_minutes: Option<i64>,
}

impl MetricsQuery {
    /// Series returned when none is requested.
    pub const DEFAULT_TYPE: &'static str = "job_duration";
    /// Window used when none is requested.
    pub const DEFAULT_HOURS: i64 = 24;

    /// Requested series, or `job_duration`.
    pub fn metric_type(&self) -> &str {
        self.metric_type.as_deref().unwrap_or(Self::DEFAULT_TYPE)
    }

    /// Requested window, or 24 hours.
    pub fn hours(&self) -> i64 {
        self.hours.unwrap_or(Self::DEFAULT_HOURS)
    }
}
