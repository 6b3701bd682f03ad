//! Append-only metric points and time bucketing.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use queuectl_core::error::AppError;

/// Known metric series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// Duration of a completed execution, in milliseconds.
    JobDuration,
    /// One point per completed job.
    JobCompleted,
    /// One point per dead-lettered job.
    JobFailed,
}

impl MetricType {
    /// Return the series name as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JobDuration => "job_duration",
            Self::JobCompleted => "job_completed",
            Self::JobFailed => "job_failed",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job_duration" => Ok(Self::JobDuration),
            "job_completed" => Ok(Self::JobCompleted),
            "job_failed" => Ok(Self::JobFailed),
            other => Err(AppError::validation(format!(
                "Unknown metric type: {other}"
            ))),
        }
    }
}

/// A recorded metric point. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Metric {
    /// Row identifier.
    pub id: i64,
    /// Series name.
    pub metric_type: String,
    /// Recorded value.
    pub value: f64,
    /// When the point was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Aggregate of the metric points falling into one time bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricBucket {
    /// Inclusive start of the bucket.
    pub start: DateTime<Utc>,
    /// Number of points.
    pub count: u64,
    /// Sum of values.
    pub sum: f64,
    /// Mean value.
    pub avg: f64,
}

/// Group points into fixed-width buckets aligned to the Unix epoch.
///
/// Input order does not matter; buckets are returned ascending and empty
/// buckets are omitted.
pub fn bucketize(points: &[Metric], width: Duration) -> Vec<MetricBucket> {
    let width_ms = width.num_milliseconds().max(1);
    let mut buckets: std::collections::BTreeMap<i64, (u64, f64)> = Default::default();

    for point in points {
        let ts = point.recorded_at.timestamp_millis();
        let key = ts.div_euclid(width_ms) * width_ms;
        let slot = buckets.entry(key).or_insert((0, 0.0));
        slot.0 += 1;
        slot.1 += point.value;
    }

    buckets
        .into_iter()
        .filter_map(|(start_ms, (count, sum))| {
            DateTime::<Utc>::from_timestamp_millis(start_ms).map(|start| MetricBucket {
                start,
                count,
                sum,
                avg: sum / count as f64,
            })
        })
        .collect()
}
