//! Job queue service: submission, lookup, dead-letter handling, and the
//! store transitions the worker loop drives.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use queuectl_core::error::AppError;
use queuectl_core::result::AppResult;
use queuectl_database::JobStore;
use queuectl_database::store::PREFIX_PROBE_LIMIT;
use queuectl_entity::config::BACKOFF_BASE_KEY;
use queuectl_entity::job::{Job, JobState, NewJob, QueueStats};
use queuectl_entity::metric::{Metric, MetricBucket, MetricType, bucketize};

use crate::metrics::MetricsRecorder;
use crate::retry::{RetryDecision, RetryPolicy};

/// Service facade over a [`JobStore`].
#[derive(Debug, Clone)]
pub struct JobQueue {
    /// Backing store
    store: Arc<dyn JobStore>,
    /// Metric sink fed by completion and dead-letter transitions
    metrics: MetricsRecorder,
}

impl JobQueue {
    /// Create a new job queue
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        let metrics = MetricsRecorder::new(Arc::clone(&store));
        Self { store, metrics }
    }

    /// The backing store
    pub fn store(&self) -> Arc<dyn JobStore> {
        Arc::clone(&self.store)
    }

    /// Submit a job. Empty commands and taken ids are rejected.
    pub async fn enqueue(&self, new: NewJob) -> AppResult<Job> {
        new.validate()?;

        if let Some(id) = new.id.as_deref() {
            if self.store.find_by_id(id).await?.is_some() {
                return Err(AppError::duplicate_id(id));
            }
        }

        let job = self.store.create(&new).await?;
        info!(
            job_id = %job.id,
            command = %job.command,
            priority = job.priority,
            max_retries = job.max_retries,
            "Job enqueued"
        );
        Ok(job)
    }

    /// List all jobs, or only those in the named state.
    pub async fn list(&self, state: Option<&str>) -> AppResult<Vec<Job>> {
        match state {
            Some(name) => {
                let state: JobState = name.parse()?;
                self.store.list_by_state(state).await
            }
            None => self.store.list_all().await,
        }
    }

    /// Exact id lookup
    pub async fn get(&self, id: &str) -> AppResult<Option<Job>> {
        self.store.find_by_id(id).await
    }

    /// Resolve an exact id or a unique id prefix.
    pub async fn resolve(&self, id_or_prefix: &str) -> AppResult<Job> {
        if let Some(job) = self.store.find_by_id(id_or_prefix).await? {
            return Ok(job);
        }

        let mut matches = self
            .store
            .find_by_prefix(id_or_prefix, PREFIX_PROBE_LIMIT)
            .await?;
        match matches.len() {
            0 => Err(AppError::not_found(format!(
                "Job \"{id_or_prefix}\" not found"
            ))),
            1 => Ok(matches.remove(0)),
            _ => Err(AppError::ambiguous_id(id_or_prefix)),
        }
    }

    /// Dead jobs, most recently updated first
    pub async fn dead_letters(&self) -> AppResult<Vec<Job>> {
        self.store.list_dead().await
    }

    /// Move a dead job back to pending with a fresh attempt budget.
    pub async fn requeue(&self, id_or_prefix: &str) -> AppResult<Job> {
        let job = self.resolve(id_or_prefix).await?;
        if job.state != JobState::Dead {
            return Err(AppError::not_dead(&job.id, job.state));
        }

        // Another operator may have re-queued it since the lookup.
        let Some(job) = self.store.requeue_dead(&job.id).await? else {
            return Err(AppError::not_dead(&job.id, "unknown"));
        };
        info!(job_id = %job.id, "Job re-queued from DLQ");
        Ok(job)
    }

    /// Read a config value
    pub async fn get_config(&self, key: &str) -> AppResult<Option<String>> {
        self.store.get_config(key).await
    }

    /// Upsert a config value
    pub async fn set_config(&self, key: &str, value: &str) -> AppResult<()> {
        if key.trim().is_empty() {
            return Err(AppError::validation("Config key cannot be empty"));
        }
        self.store.set_config(key, value).await?;
        info!(key, value, "Config updated");
        Ok(())
    }

    /// The retry policy built from the current `backoff_base` value.
    pub async fn retry_policy(&self) -> AppResult<RetryPolicy> {
        let raw = self.store.get_config(BACKOFF_BASE_KEY).await?;
        Ok(RetryPolicy::from_config_value(raw.as_deref()))
    }

    /// Claimable jobs at `now`
    pub async fn candidates(&self, limit: i64, now: DateTime<Utc>) -> AppResult<Vec<Job>> {
        self.store.fetch_candidates(limit, now).await
    }

    /// Enter processing; returns the job as now stored.
    pub async fn start_processing(&self, job_id: &str) -> AppResult<Job> {
        self.store
            .transition_state(job_id, JobState::Processing)
            .await
    }

    /// Mark a job completed and record its metrics.
    pub async fn complete(&self, job_id: &str, output: &str, duration_ms: i64) -> AppResult<Job> {
        let job = self
            .store
            .record_completion(job_id, output, duration_ms)
            .await?;
        self.metrics.job_completed(duration_ms).await;
        Ok(job)
    }

    /// Mark a job failed, eligible again at `next_retry_at`.
    pub async fn schedule_retry(
        &self,
        job_id: &str,
        attempts: i32,
        error: &str,
        next_retry_at: DateTime<Utc>,
    ) -> AppResult<Job> {
        self.store
            .schedule_retry(job_id, attempts, error, next_retry_at)
            .await
    }

    /// Dead-letter a job and record the failure metric.
    pub async fn move_to_dead(&self, job_id: &str, attempts: i32, error: &str) -> AppResult<Job> {
        let job = self.store.move_to_dead(job_id, attempts, error).await?;
        self.metrics.job_failed().await;
        Ok(job)
    }

    /// Apply the retry policy to a failed execution of `job` observed at
    /// `now`.
    pub async fn record_failure(
        &self,
        job: &Job,
        error: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Job> {
        let policy = self.retry_policy().await?;
        match policy.decide(job.attempts, job.max_retries, now) {
            RetryDecision::Retry {
                attempts,
                next_retry_at,
            } => {
                self.schedule_retry(&job.id, attempts, error, next_retry_at)
                    .await
            }
            RetryDecision::DeadLetter { attempts } => {
                self.move_to_dead(&job.id, attempts, error).await
            }
        }
    }

    /// Clear the lease on a job
    pub async fn release(&self, job_id: &str) -> AppResult<()> {
        self.store.release_lease(job_id).await
    }

    /// Counts per state and the average completed duration.
    pub async fn stats(&self) -> AppResult<QueueStats> {
        let counts = self.store.count_by_state().await?;
        let avg = self.store.average_completed_duration().await?;
        Ok(QueueStats::from_counts(counts, avg))
    }

    /// Points of `metric_type` recorded within the last `hours` hours.
    pub async fn metric_series(&self, metric_type: &str, hours: i64) -> AppResult<Vec<Metric>> {
        let metric_type: MetricType = metric_type.parse()?;
        if hours <= 0 {
            return Err(AppError::validation("hours must be positive"));
        }
        let since = Duration::try_hours(hours)
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .ok_or_else(|| AppError::validation("hours is out of range"))?;
        debug!(metric = %metric_type, %since, "Reading metric series");
        self.store.metrics_since(metric_type.as_str(), since).await
    }

    /// [`Self::metric_series`] grouped into buckets of `bucket_minutes`.
    pub async fn metric_buckets(
        &self,
        metric_type: &str,
        hours: i64,
        bucket_minutes: i64,
    ) -> AppResult<Vec<MetricBucket>> {
        if bucket_minutes <= 0 {
            return Err(AppError::validation("bucket_minutes must be positive"));
        }
        let width = Duration::try_minutes(bucket_minutes)
            .ok_or_else(|| AppError::validation("bucket_minutes is out of range"))?;
        let points = self.metric_series(metric_type, hours).await?;
        Ok(bucketize(&points, width))
    }
}
