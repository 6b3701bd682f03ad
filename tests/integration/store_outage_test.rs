//! Worker behavior while the job store is failing.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use queuectl_core::error::{AppError, ErrorKind};
use queuectl_core::result::AppResult;
use queuectl_database::{JobStore, MemoryJobStore};
use queuectl_entity::job::{Job, JobState, NewJob};
use queuectl_entity::metric::{Metric, MetricType};

use crate::helpers::TestQueue;

/// In-process store that fails a configurable number of calls.
#[derive(Debug)]
struct FlakyStore {
    inner: MemoryJobStore,
    failing_fetches: AtomicUsize,
    failing_completions: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl FlakyStore {
    fn failing(fetches: usize, completions: usize) -> Self {
        Self {
            inner: MemoryJobStore::new(),
            failing_fetches: AtomicUsize::new(fetches),
            failing_completions: AtomicUsize::new(completions),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    fn outage(budget: &AtomicUsize) -> AppResult<()> {
        let left = budget.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match left {
            Ok(_) => Err(AppError::service_unavailable("Job store unreachable")),
            Err(_) => Ok(()),
        }
    }
}

#[async_trait]
impl JobStore for FlakyStore {
    async fn create(&self, new: &NewJob) -> AppResult<Job> {
        self.inner.create(new).await
    }

    async fn fetch_candidates(&self, limit: i64, now: DateTime<Utc>) -> AppResult<Vec<Job>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Self::outage(&self.failing_fetches)?;
        self.inner.fetch_candidates(limit, now).await
    }

    async fn try_acquire_lease(
        &self,
        job_id: &str,
        worker_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.inner.try_acquire_lease(job_id, worker_id, now).await
    }

    async fn release_lease(&self, job_id: &str) -> AppResult<()> {
        self.inner.release_lease(job_id).await
    }

    async fn transition_state(&self, job_id: &str, state: JobState) -> AppResult<Job> {
        self.inner.transition_state(job_id, state).await
    }

    async fn record_completion(
        &self,
        job_id: &str,
        output: &str,
        duration_ms: i64,
    ) -> AppResult<Job> {
        Self::outage(&self.failing_completions)?;
        self.inner.record_completion(job_id, output, duration_ms).await
    }

    async fn schedule_retry(
        &self,
        job_id: &str,
        attempts: i32,
        error: &str,
        next_retry_at: DateTime<Utc>,
    ) -> AppResult<Job> {
        self.inner
            .schedule_retry(job_id, attempts, error, next_retry_at)
            .await
    }

    async fn move_to_dead(&self, job_id: &str, attempts: i32, error: &str) -> AppResult<Job> {
        self.inner.move_to_dead(job_id, attempts, error).await
    }

    async fn list_all(&self) -> AppResult<Vec<Job>> {
        self.inner.list_all().await
    }

    async fn list_by_state(&self, state: JobState) -> AppResult<Vec<Job>> {
        self.inner.list_by_state(state).await
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Job>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_prefix(&self, prefix: &str, limit: i64) -> AppResult<Vec<Job>> {
        self.inner.find_by_prefix(prefix, limit).await
    }

    async fn list_dead(&self) -> AppResult<Vec<Job>> {
        self.inner.list_dead().await
    }

    async fn requeue_dead(&self, id: &str) -> AppResult<Option<Job>> {
        self.inner.requeue_dead(id).await
    }

    async fn get_config(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get_config(key).await
    }

    async fn set_config(&self, key: &str, value: &str) -> AppResult<()> {
        self.inner.set_config(key, value).await
    }

    async fn record_metric(&self, metric_type: MetricType, value: f64) -> AppResult<()> {
        self.inner.record_metric(metric_type, value).await
    }

    async fn metrics_since(&self, metric_type: &str, since: DateTime<Utc>) -> AppResult<Vec<Metric>> {
        self.inner.metrics_since(metric_type, since).await
    }

    async fn count_by_state(&self) -> AppResult<Vec<(JobState, i64)>> {
        self.inner.count_by_state().await
    }

    async fn average_completed_duration(&self) -> AppResult<Option<f64>> {
        self.inner.average_completed_duration().await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}

#[tokio::test]
async fn test_failed_completion_still_releases_lease() {
    let t = TestQueue::with_store(Arc::new(FlakyStore::failing(0, 1)));
    let runner = t.runner("worker-a");
    let job = t.enqueue(NewJob::new("true").with_id("unlucky")).await;

    let err = runner.run_iteration(Utc::now()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);

    let stored = t.job(&job.id).await;
    assert!(stored.locked_by.is_none());
    assert!(stored.locked_at.is_none());
    assert_ne!(stored.state, JobState::Completed);
}

#[tokio::test]
async fn test_loop_survives_store_outage() {
    let store = Arc::new(FlakyStore::failing(3, 0));
    let t = TestQueue::with_store(Arc::clone(&store) as Arc<dyn JobStore>);
    let job = t.enqueue(NewJob::new("true").with_id("patient")).await;

    let runner = t.runner("worker-a");
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(async move { runner.run(rx).await });

    let completed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if t.job(&job.id).await.state == JobState::Completed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(completed.is_ok(), "job never completed after the outage");
    assert!(!handle.is_finished());

    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();

    assert!(store.fetch_calls.load(Ordering::SeqCst) >= 4);
    assert_eq!(store.failing_fetches.load(Ordering::SeqCst), 0);
}
