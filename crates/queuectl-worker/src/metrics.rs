//! Append-only job metrics.

use std::sync::Arc;

use tracing::warn;

use queuectl_database::JobStore;
use queuectl_entity::metric::MetricType;

/// Writes metric points after the matching store transition succeeded.
///
/// A metric write failure is logged and swallowed; it never changes the
/// outcome of the job it describes.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    store: Arc<dyn JobStore>,
}

impl MetricsRecorder {
    /// Create a recorder writing to `store`.
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// Record a completion: its duration plus one `job_completed` point.
    pub async fn job_completed(&self, duration_ms: i64) {
        self.emit(MetricType::JobDuration, duration_ms as f64).await;
        self.emit(MetricType::JobCompleted, 1.0).await;
    }

    /// Record a dead-lettered job.
    pub async fn job_failed(&self) {
        self.emit(MetricType::JobFailed, 1.0).await;
    }

    async fn emit(&self, metric_type: MetricType, value: f64) {
        if let Err(e) = self.store.record_metric(metric_type, value).await {
            warn!(metric = %metric_type, error = %e, "Failed to record metric");
        }
    }
}
