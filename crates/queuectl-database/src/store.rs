//! The durable job store contract shared by every backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use queuectl_core::result::AppResult;
use queuectl_entity::job::{Job, JobState, NewJob};
use queuectl_entity::metric::{Metric, MetricType};

/// Maximum number of rows a prefix lookup needs to tell "unique" from
/// "ambiguous".
pub const PREFIX_PROBE_LIMIT: i64 = 2;

/// Durable record of jobs, config entries, and metrics.
///
/// Every operation must be safe under concurrent callers from many worker
/// processes. [`JobStore::try_acquire_lease`] is the single point of mutual
/// exclusion and must behave as a linearizable compare-and-set per job.
#[async_trait]
pub trait JobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new pending job. Fails with `DuplicateId` when a
    /// client-supplied id already exists.
    async fn create(&self, new: &NewJob) -> AppResult<Job>;

    /// Snapshot of claimable jobs at `now`, ordered by priority descending
    /// then creation time ascending.
    ///
    /// Claimable means pending or retry-due failed, unlocked, and not
    /// deferred past `now`. Ordering and filtering are evaluated together by
    /// the backend, never by the caller.
    async fn fetch_candidates(&self, limit: i64, now: DateTime<Utc>) -> AppResult<Vec<Job>>;

    /// Atomically set `locked_by`/`locked_at` if no lease is held and the job
    /// is still claimable at `now`. Returns `false` on a lost race.
    async fn try_acquire_lease(
        &self,
        job_id: &str,
        worker_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Clear `locked_by`/`locked_at` unconditionally.
    async fn release_lease(&self, job_id: &str) -> AppResult<()>;

    /// Move a job to `state`, stamping `started_at` (and clearing
    /// `next_retry_at`) when entering processing.
    async fn transition_state(&self, job_id: &str, state: JobState) -> AppResult<Job>;

    /// Mark a job completed with its output and duration.
    async fn record_completion(&self, job_id: &str, output: &str, duration_ms: i64)
    -> AppResult<Job>;

    /// Mark a job failed and eligible again at `next_retry_at`.
    async fn schedule_retry(
        &self,
        job_id: &str,
        attempts: i32,
        error: &str,
        next_retry_at: DateTime<Utc>,
    ) -> AppResult<Job>;

    /// Mark a job dead. Terminal until an operator re-queues it.
    async fn move_to_dead(&self, job_id: &str, attempts: i32, error: &str) -> AppResult<Job>;

    /// All jobs, newest first.
    async fn list_all(&self) -> AppResult<Vec<Job>>;

    /// Jobs in `state`, newest first.
    async fn list_by_state(&self, state: JobState) -> AppResult<Vec<Job>>;

    /// Exact id lookup.
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Job>>;

    /// Up to `limit` jobs whose id starts with `prefix`.
    async fn find_by_prefix(&self, prefix: &str, limit: i64) -> AppResult<Vec<Job>>;

    /// Dead jobs, most recently updated first.
    async fn list_dead(&self) -> AppResult<Vec<Job>>;

    /// Reset a dead job to pending (`attempts = 0`, no error, no retry
    /// time). Returns `None` when the job is absent or not dead.
    async fn requeue_dead(&self, id: &str) -> AppResult<Option<Job>>;

    /// Read a config value.
    async fn get_config(&self, key: &str) -> AppResult<Option<String>>;

    /// Insert or update a config value.
    async fn set_config(&self, key: &str, value: &str) -> AppResult<()>;

    /// Append a metric point stamped with the current time.
    async fn record_metric(&self, metric_type: MetricType, value: f64) -> AppResult<()>;

    /// Points of `metric_type` recorded at or after `since`, oldest first.
    async fn metrics_since(&self, metric_type: &str, since: DateTime<Utc>) -> AppResult<Vec<Metric>>;

    /// Number of jobs per state (states with no jobs may be omitted).
    async fn count_by_state(&self) -> AppResult<Vec<(JobState, i64)>>;

    /// Mean duration of completed jobs in milliseconds.
    async fn average_completed_duration(&self) -> AppResult<Option<f64>>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
