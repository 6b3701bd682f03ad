//! In-memory [`JobStore`] implementation using dashmap.

use std::cmp::Reverse;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use queuectl_core::error::AppError;
use queuectl_core::result::AppResult;
use queuectl_entity::job::{Job, JobState, NewJob};
use queuectl_entity::metric::{Metric, MetricType};

use crate::store::JobStore;

/// A job plus its insertion sequence, used as the final ordering tie-break.
#[derive(Debug, Clone)]
struct StoredJob {
    seq: u64,
    job: Job,
}

/// Job store held entirely in process memory.
///
/// Per-key mutations go through `DashMap::get_mut`, which holds the shard
/// write lock for the duration of the closure; the lease compare-and-set is
/// therefore atomic per job.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: DashMap<String, StoredJob>,
    sequence: AtomicU64,
    config: DashMap<String, String>,
    metrics: RwLock<Vec<Metric>>,
    metric_ids: AtomicI64,
}

impl MemoryJobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `f` to a job under its shard lock and return the updated copy.
    fn update<F>(&self, job_id: &str, f: F) -> AppResult<Job>
    where
        F: FnOnce(&mut Job),
    {
        let mut slot = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| AppError::not_found(format!("Job \"{job_id}\" not found")))?;
        f(&mut slot.job);
        slot.job.updated_at = Utc::now();
        Ok(slot.job.clone())
    }

    /// Clone every stored job matching `keep`.
    fn snapshot<F>(&self, keep: F) -> Vec<StoredJob>
    where
        F: Fn(&Job) -> bool,
    {
        self.jobs
            .iter()
            .filter(|entry| keep(&entry.value().job))
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn newest_first(mut rows: Vec<StoredJob>) -> Vec<Job> {
        rows.sort_by_key(|row| (Reverse(row.job.created_at), Reverse(row.seq)));
        rows.into_iter().map(|row| row.job).collect()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, new: &NewJob) -> AppResult<Job> {
        let id = new
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        match self.jobs.entry(id.clone()) {
            Entry::Occupied(_) => Err(AppError::duplicate_id(&id)),
            Entry::Vacant(slot) => {
                let job = Job::from_new(id, new, Utc::now());
                let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
                slot.insert(StoredJob {
                    seq,
                    job: job.clone(),
                });
                Ok(job)
            }
        }
    }

    async fn fetch_candidates(&self, limit: i64, now: DateTime<Utc>) -> AppResult<Vec<Job>> {
        let mut rows = self.snapshot(|job| job.is_claimable(now));
        rows.sort_by_key(|row| (Reverse(row.job.priority), row.job.created_at, row.seq));
        Ok(rows
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|row| row.job)
            .collect())
    }

    async fn try_acquire_lease(
        &self,
        job_id: &str,
        worker_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let Some(mut slot) = self.jobs.get_mut(job_id) else {
            return Ok(false);
        };
        if !slot.job.is_claimable(now) {
            debug!(job_id, worker_id, "Lease not acquired");
            return Ok(false);
        }
        slot.job.locked_by = Some(worker_id.to_string());
        slot.job.locked_at = Some(now);
        slot.job.updated_at = Utc::now();
        Ok(true)
    }

    async fn release_lease(&self, job_id: &str) -> AppResult<()> {
        self.update(job_id, |job| {
            job.locked_by = None;
            job.locked_at = None;
        })
        .map(|_| ())
    }

    async fn transition_state(&self, job_id: &str, state: JobState) -> AppResult<Job> {
        let mut slot = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| AppError::not_found(format!("Job \"{job_id}\" not found")))?;
        let job = &mut slot.job;
        if !job.state.can_transition_to(state) {
            return Err(AppError::invalid_transition(job_id, job.state, state));
        }

        let now = Utc::now();
        job.state = state;
        if state == JobState::Processing {
            job.started_at = Some(now);
            job.next_retry_at = None;
        }
        job.updated_at = now;
        Ok(job.clone())
    }

    async fn record_completion(
        &self,
        job_id: &str,
        output: &str,
        duration_ms: i64,
    ) -> AppResult<Job> {
        self.update(job_id, |job| {
            job.state = JobState::Completed;
            job.output = Some(output.to_string());
            job.duration_ms = Some(duration_ms);
            job.completed_at = Some(Utc::now());
        })
    }

    async fn schedule_retry(
        &self,
        job_id: &str,
        attempts: i32,
        error: &str,
        next_retry_at: DateTime<Utc>,
    ) -> AppResult<Job> {
        self.update(job_id, |job| {
            job.state = JobState::Failed;
            job.attempts = attempts;
            job.error = Some(error.to_string());
            job.next_retry_at = Some(next_retry_at);
        })
    }

    async fn move_to_dead(&self, job_id: &str, attempts: i32, error: &str) -> AppResult<Job> {
        self.update(job_id, |job| {
            job.state = JobState::Dead;
            job.attempts = attempts;
            job.error = Some(error.to_string());
            job.next_retry_at = None;
        })
    }

    async fn list_all(&self) -> AppResult<Vec<Job>> {
        Ok(Self::newest_first(self.snapshot(|_| true)))
    }

    async fn list_by_state(&self, state: JobState) -> AppResult<Vec<Job>> {
        Ok(Self::newest_first(self.snapshot(|job| job.state == state)))
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Job>> {
        Ok(self.jobs.get(id).map(|slot| slot.job.clone()))
    }

    async fn find_by_prefix(&self, prefix: &str, limit: i64) -> AppResult<Vec<Job>> {
        let mut rows = self.snapshot(|job| job.id.starts_with(prefix));
        rows.sort_by(|a, b| a.job.id.cmp(&b.job.id));
        Ok(rows
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|row| row.job)
            .collect())
    }

    async fn list_dead(&self) -> AppResult<Vec<Job>> {
        let mut rows = self.snapshot(|job| job.state == JobState::Dead);
        rows.sort_by_key(|row| (Reverse(row.job.updated_at), Reverse(row.seq)));
        Ok(rows.into_iter().map(|row| row.job).collect())
    }

    async fn requeue_dead(&self, id: &str) -> AppResult<Option<Job>> {
        let Some(mut slot) = self.jobs.get_mut(id) else {
            return Ok(None);
        };
        if slot.job.state != JobState::Dead {
            return Ok(None);
        }
        slot.job.state = JobState::Pending;
        slot.job.attempts = 0;
        slot.job.error = None;
        slot.job.next_retry_at = None;
        slot.job.updated_at = Utc::now();
        Ok(Some(slot.job.clone()))
    }

    async fn get_config(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.config.get(key).map(|value| value.clone()))
    }

    async fn set_config(&self, key: &str, value: &str) -> AppResult<()> {
        self.config.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn record_metric(&self, metric_type: MetricType, value: f64) -> AppResult<()> {
        let id = self.metric_ids.fetch_add(1, Ordering::SeqCst) + 1;
        self.metrics.write().await.push(Metric {
            id,
            metric_type: metric_type.as_str().to_string(),
            value,
            recorded_at: Utc::now(),
        });
        Ok(())
    }

    async fn metrics_since(
        &self,
        metric_type: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<Metric>> {
        let metrics = self.metrics.read().await;
        let mut points: Vec<Metric> = metrics
            .iter()
            .filter(|m| m.metric_type == metric_type && m.recorded_at >= since)
            .cloned()
            .collect();
        points.sort_by_key(|m| (m.recorded_at, m.id));
        Ok(points)
    }

    async fn count_by_state(&self) -> AppResult<Vec<(JobState, i64)>> {
        let mut counts: std::collections::BTreeMap<JobState, i64> = Default::default();
        for entry in self.jobs.iter() {
            *counts.entry(entry.value().job.state).or_insert(0) += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn average_completed_duration(&self) -> AppResult<Option<f64>> {
        let durations: Vec<i64> = self
            .snapshot(|job| job.state == JobState::Completed)
            .into_iter()
            .map(|row| row.job.duration_ms.unwrap_or(0))
            .collect();
        if durations.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            durations.iter().sum::<i64>() as f64 / durations.len() as f64,
        ))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use queuectl_core::error::ErrorKind;

    use super::*;

    async fn seed(store: &MemoryJobStore, id: &str, priority: i32) -> Job {
        store
            .create(&NewJob::new("true").with_id(id).with_priority(priority))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = MemoryJobStore::new();
        seed(&store, "job-1", 0).await;
        let err = store
            .create(&NewJob::new("echo again").with_id("job-1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateId);
    }

    #[tokio::test]
    async fn test_generated_ids_are_unique() {
        let store = MemoryJobStore::new();
        let a = store.create(&NewJob::new("true")).await.unwrap();
        let b = store.create(&NewJob::new("true")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.state, JobState::Pending);
        assert_eq!(a.attempts, 0);
    }

    #[tokio::test]
    async fn test_candidates_ordered_by_priority_then_age() {
        let store = MemoryJobStore::new();
        seed(&store, "low-old", 1).await;
        seed(&store, "high", 5).await;
        seed(&store, "low-new", 1).await;

        let ids: Vec<String> = store
            .fetch_candidates(10, Utc::now())
            .await
            .unwrap()
            .into_iter()
            .map(|job| job.id)
            .collect();
        assert_eq!(ids, vec!["high", "low-old", "low-new"]);

        let limited = store.fetch_candidates(1, Utc::now()).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id, "high");
    }

    #[tokio::test]
    async fn test_candidates_skip_locked_deferred_and_waiting_jobs() {
        let store = MemoryJobStore::new();
        let now = Utc::now();
        seed(&store, "locked", 0).await;
        store.try_acquire_lease("locked", "w1", now).await.unwrap();
        store
            .create(&NewJob::new("true").with_id("later").with_run_at(now + Duration::hours(1)))
            .await
            .unwrap();
        seed(&store, "waiting", 0).await;
        store
            .schedule_retry("waiting", 1, "boom", now + Duration::seconds(30))
            .await
            .unwrap();
        seed(&store, "done", 0).await;
        store.record_completion("done", "", 5).await.unwrap();
        seed(&store, "ready", 0).await;

        let candidates = store.fetch_candidates(10, now).await.unwrap();
        let ids: Vec<&str> = candidates.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["ready"]);
        assert!(candidates.iter().all(|j| j.locked_by.is_none()));

        let later = store
            .fetch_candidates(10, now + Duration::hours(2))
            .await
            .unwrap();
        let mut ids: Vec<&str> = later.iter().map(|j| j.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["later", "ready", "waiting"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_lease_has_single_winner() {
        let store = Arc::new(MemoryJobStore::new());
        seed(&store, "contended", 0).await;
        let now = Utc::now();

        let mut handles = Vec::new();
        for n in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .try_acquire_lease("contended", &format!("worker-{n}"), now)
                    .await
                    .unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);

        let job = store.find_by_id("contended").await.unwrap().unwrap();
        assert!(job.locked_by.is_some());
        assert_eq!(job.locked_at, Some(now));
    }

    #[tokio::test]
    async fn test_release_then_reacquire() {
        let store = MemoryJobStore::new();
        seed(&store, "job", 0).await;
        let now = Utc::now();
        assert!(store.try_acquire_lease("job", "w1", now).await.unwrap());
        assert!(!store.try_acquire_lease("job", "w2", now).await.unwrap());
        store.release_lease("job").await.unwrap();
        let job = store.find_by_id("job").await.unwrap().unwrap();
        assert!(job.locked_by.is_none() && job.locked_at.is_none());
        assert!(store.try_acquire_lease("job", "w2", now).await.unwrap());
    }

    #[tokio::test]
    async fn test_lease_refused_for_finished_job() {
        let store = MemoryJobStore::new();
        seed(&store, "stale", 0).await;
        store.record_completion("stale", "ok", 1).await.unwrap();
        assert!(!store.try_acquire_lease("stale", "w1", Utc::now()).await.unwrap());
        assert!(!store.try_acquire_lease("missing", "w1", Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_processing_stamps_start_and_clears_retry_time() {
        let store = MemoryJobStore::new();
        seed(&store, "job", 0).await;
        store
            .schedule_retry("job", 1, "boom", Utc::now())
            .await
            .unwrap();
        let job = store
            .transition_state("job", JobState::Processing)
            .await
            .unwrap();
        assert_eq!(job.state, JobState::Processing);
        assert!(job.started_at.is_some());
        assert!(job.next_retry_at.is_none());
    }

    #[tokio::test]
    async fn test_transition_outside_lifecycle_rejected() {
        let store = MemoryJobStore::new();
        seed(&store, "done", 0).await;
        store.record_completion("done", "ok", 1).await.unwrap();

        let err = store
            .transition_state("done", JobState::Processing)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidState);
        assert_eq!(
            store.find_by_id("done").await.unwrap().unwrap().state,
            JobState::Completed
        );

        let err = store
            .transition_state("missing", JobState::Processing)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_prefix_lookup_stops_at_limit() {
        let store = MemoryJobStore::new();
        seed(&store, "abc123", 0).await;
        seed(&store, "abc456", 0).await;
        seed(&store, "xyz", 0).await;

        assert_eq!(store.find_by_prefix("abc", 2).await.unwrap().len(), 2);
        let unique = store.find_by_prefix("abc1", 2).await.unwrap();
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].id, "abc123");
        assert!(store.find_by_prefix("nope", 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_requeue_only_from_dead() {
        let store = MemoryJobStore::new();
        seed(&store, "job", 0).await;
        assert!(store.requeue_dead("job").await.unwrap().is_none());

        store.move_to_dead("job", 4, "gave up").await.unwrap();
        let job = store.requeue_dead("job").await.unwrap().unwrap();
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.attempts, 0);
        assert!(job.error.is_none());
        assert!(job.next_retry_at.is_none());
    }

    #[tokio::test]
    async fn test_config_upsert() {
        let store = MemoryJobStore::new();
        assert!(store.get_config("backoff_base").await.unwrap().is_none());
        store.set_config("backoff_base", "2").await.unwrap();
        store.set_config("backoff_base", "3").await.unwrap();
        assert_eq!(
            store.get_config("backoff_base").await.unwrap().as_deref(),
            Some("3")
        );
    }

    #[tokio::test]
    async fn test_metrics_window_and_stats() {
        let store = MemoryJobStore::new();
        let before = Utc::now() - Duration::seconds(1);
        store.record_metric(MetricType::JobDuration, 120.0).await.unwrap();
        store.record_metric(MetricType::JobFailed, 1.0).await.unwrap();
        store.record_metric(MetricType::JobDuration, 80.0).await.unwrap();

        let points = store.metrics_since("job_duration", before).await.unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].value, 120.0);
        assert!(
            store
                .metrics_since("job_duration", Utc::now() + Duration::hours(1))
                .await
                .unwrap()
                .is_empty()
        );

        seed(&store, "a", 0).await;
        seed(&store, "b", 0).await;
        store.record_completion("a", "", 100).await.unwrap();
        store.record_completion("b", "", 300).await.unwrap();
        assert_eq!(
            store.average_completed_duration().await.unwrap(),
            Some(200.0)
        );
        assert_eq!(
            store.count_by_state().await.unwrap(),
            vec![(JobState::Completed, 2)]
        );
    }
}
