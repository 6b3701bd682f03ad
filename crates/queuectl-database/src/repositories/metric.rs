//! Append-only metric repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use queuectl_core::error::{AppError, ErrorKind};
use queuectl_core::result::AppResult;
use queuectl_entity::metric::Metric;

/// Repository for the `metrics` table. Rows are only ever inserted.
#[derive(Debug, Clone)]
pub struct MetricRepository {
    pool: PgPool,
}

impl MetricRepository {
    /// Create a new metric repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append one point.
    pub async fn insert(&self, metric_type: &str, value: f64) -> AppResult<()> {
        sqlx::query("INSERT INTO metrics (metric_type, value) VALUES ($1, $2)")
            .bind(metric_type)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record metric", e))?;
        Ok(())
    }

    /// Points of one series recorded since `since`, oldest first.
    pub async fn find_since(&self, metric_type: &str, since: DateTime<Utc>) -> AppResult<Vec<Metric>> {
        sqlx::query_as::<_, Metric>(
            "SELECT * FROM metrics WHERE metric_type = $1 AND recorded_at >= $2 \
             ORDER BY recorded_at ASC",
        )
        .bind(metric_type)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read metrics", e))
    }
}
