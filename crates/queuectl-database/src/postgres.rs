//! PostgreSQL-backed [`JobStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use queuectl_core::config::DatabaseConfig;
use queuectl_core::result::AppResult;
use queuectl_entity::job::{Job, JobState, NewJob};
use queuectl_entity::metric::{Metric, MetricType};

use crate::connection::DatabasePool;
use crate::migration::run_migrations;
use crate::repositories::{ConfigRepository, JobRepository, MetricRepository};
use crate::store::JobStore;

/// Job store shared by every worker process through one database.
#[derive(Debug, Clone)]
pub struct PostgresJobStore {
    db: DatabasePool,
    jobs: JobRepository,
    config: ConfigRepository,
    metrics: MetricRepository,
}

impl PostgresJobStore {
    /// Build the store on top of an existing pool.
    pub fn new(db: DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            jobs: JobRepository::new(pool.clone()),
            config: ConfigRepository::new(pool.clone()),
            metrics: MetricRepository::new(pool),
            db,
        }
    }

    /// Connect, optionally migrate, and build the store.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let db = DatabasePool::connect(config).await?;
        if config.run_migrations {
            run_migrations(db.pool()).await?;
        } else {
            info!("Skipping database migrations");
        }
        Ok(Self::new(db))
    }
}

#[async_trait]
impl JobStore for PostgresJobStore {
    async fn create(&self, new: &NewJob) -> AppResult<Job> {
        self.jobs.create(new).await
    }

    async fn fetch_candidates(&self, limit: i64, now: DateTime<Utc>) -> AppResult<Vec<Job>> {
        self.jobs.candidates(limit, now).await
    }

    async fn try_acquire_lease(
        &self,
        job_id: &str,
        worker_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.jobs.acquire_lease(job_id, worker_id, now).await
    }

    async fn release_lease(&self, job_id: &str) -> AppResult<()> {
        self.jobs.release_lease(job_id).await
    }

    async fn transition_state(&self, job_id: &str, state: JobState) -> AppResult<Job> {
        self.jobs.set_state(job_id, state).await
    }

    async fn record_completion(
        &self,
        job_id: &str,
        output: &str,
        duration_ms: i64,
    ) -> AppResult<Job> {
        self.jobs.complete(job_id, output, duration_ms).await
    }

    async fn schedule_retry(
        &self,
        job_id: &str,
        attempts: i32,
        error: &str,
        next_retry_at: DateTime<Utc>,
    ) -> AppResult<Job> {
        self.jobs.fail(job_id, attempts, error, next_retry_at).await
    }

    async fn move_to_dead(&self, job_id: &str, attempts: i32, error: &str) -> AppResult<Job> {
        self.jobs.bury(job_id, attempts, error).await
    }

    async fn list_all(&self) -> AppResult<Vec<Job>> {
        self.jobs.find_all().await
    }

    async fn list_by_state(&self, state: JobState) -> AppResult<Vec<Job>> {
        self.jobs.find_by_state(state).await
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Job>> {
        self.jobs.find_by_id(id).await
    }

    async fn find_by_prefix(&self, prefix: &str, limit: i64) -> AppResult<Vec<Job>> {
        self.jobs.find_by_prefix(prefix, limit).await
    }

    async fn list_dead(&self) -> AppResult<Vec<Job>> {
        self.jobs.find_dead().await
    }

    async fn requeue_dead(&self, id: &str) -> AppResult<Option<Job>> {
        self.jobs.requeue_dead(id).await
    }

    async fn get_config(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.config.get(key).await?.map(|entry| entry.value))
    }

    async fn set_config(&self, key: &str, value: &str) -> AppResult<()> {
        self.config.upsert(key, value).await
    }

    async fn record_metric(&self, metric_type: MetricType, value: f64) -> AppResult<()> {
        self.metrics.insert(metric_type.as_str(), value).await
    }

    async fn metrics_since(
        &self,
        metric_type: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<Metric>> {
        self.metrics.find_since(metric_type, since).await
    }

    async fn count_by_state(&self) -> AppResult<Vec<(JobState, i64)>> {
        self.jobs.count_by_state().await
    }

    async fn average_completed_duration(&self) -> AppResult<Option<f64>> {
        self.jobs.average_completed_duration().await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.db.health_check().await
    }
}
