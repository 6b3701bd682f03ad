//! Worker runner: the poll, lease, execute, finalize loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time;
use tracing::{error, info, trace, warn};

use queuectl_core::config::WorkerConfig;
use queuectl_core::result::AppResult;
use queuectl_entity::job::{Job, JobState};

use crate::executor::CommandExecutor;
use crate::lease::LeaseManager;
use crate::queue::JobQueue;

/// Result of one loop iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IterationOutcome {
    /// No candidate could be leased.
    Idle,
    /// The leased job exited successfully.
    Completed {
        /// Job that ran.
        job_id: String,
        /// Execution time in milliseconds.
        duration_ms: i64,
    },
    /// The leased job failed and will be retried.
    RetryScheduled {
        /// Job that ran.
        job_id: String,
        /// Failures so far.
        attempts: i32,
        /// When it becomes eligible again.
        next_retry_at: Option<DateTime<Utc>>,
    },
    /// The leased job failed with its retries exhausted.
    DeadLettered {
        /// Job that ran.
        job_id: String,
        /// Failures so far.
        attempts: i32,
    },
}

/// Sequential worker processing at most one job per iteration.
#[derive(Debug)]
pub struct WorkerRunner {
    /// Queue service over the shared store
    queue: Arc<JobQueue>,
    /// Lease protocol bound to this worker's identity
    leases: LeaseManager,
    /// Command executor
    executor: CommandExecutor,
    /// Worker configuration
    config: WorkerConfig,
}

impl WorkerRunner {
    /// Create a runner identified by `config.resolve_worker_id()`.
    pub fn new(queue: Arc<JobQueue>, config: WorkerConfig) -> Self {
        let worker_id = config.resolve_worker_id();
        let leases = LeaseManager::new(queue.store(), worker_id);
        Self {
            queue,
            leases,
            executor: CommandExecutor::new(),
            config,
        }
    }

    /// This worker's lease identity
    pub fn worker_id(&self) -> &str {
        self.leases.worker_id()
    }

    /// Run until the shutdown flag turns true.
    ///
    /// The flag is checked between iterations only; a running command is
    /// never interrupted by shutdown, only by its own timeout.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            worker_id = %self.worker_id(),
            poll_interval_ms = self.config.poll_interval_ms,
            batch_size = self.config.batch_size,
            "Worker started"
        );

        while !*shutdown.borrow() {
            match self.run_iteration(Utc::now()).await {
                Ok(IterationOutcome::Idle) => {
                    trace!(worker_id = %self.worker_id(), "No claimable jobs");
                    Self::pause(self.config.poll_interval_ms, &mut shutdown).await;
                }
                Ok(_) => {}
                Err(e) => {
                    error!(worker_id = %self.worker_id(), error = %e, "Worker iteration failed");
                    Self::pause(self.config.error_backoff_ms, &mut shutdown).await;
                }
            }
        }

        info!(worker_id = %self.worker_id(), "Worker stopped");
    }

    /// Fetch candidates at `now`, lease one, execute it, and finalize it.
    ///
    /// The lease is released whether processing succeeds or errors.
    pub async fn run_iteration(&self, now: DateTime<Utc>) -> AppResult<IterationOutcome> {
        let candidates = self.queue.candidates(self.config.batch_size, now).await?;
        let Some(job) = self.leases.acquire(candidates, now).await? else {
            return Ok(IterationOutcome::Idle);
        };

        let processed = self.process(&job.id, now).await;
        let released = self.leases.release(&job.id).await;

        let outcome = processed?;
        released?;
        Ok(outcome)
    }

    async fn process(&self, job_id: &str, now: DateTime<Utc>) -> AppResult<IterationOutcome> {
        let job = self.queue.start_processing(job_id).await?;
        info!(
            job_id = %job.id,
            worker_id = %self.worker_id(),
            attempt = job.attempts + 1,
            max_retries = job.max_retries,
            "Processing job"
        );

        let result = self.executor.execute(&job.command, job.timeout()).await;

        if result.is_success() {
            self.queue
                .complete(&job.id, &result.output, result.duration_ms)
                .await?;
            info!(
                job_id = %job.id,
                worker_id = %self.worker_id(),
                duration_ms = result.duration_ms,
                "Job completed"
            );
            return Ok(IterationOutcome::Completed {
                job_id: job.id,
                duration_ms: result.duration_ms,
            });
        }

        let message = result
            .error
            .unwrap_or_else(|| "Command failed".to_string());
        warn!(job_id = %job.id, worker_id = %self.worker_id(), error = %message, "Job failed");

        let failed = self.queue.record_failure(&job, &message, now).await?;
        Ok(self.failure_outcome(failed))
    }

    fn failure_outcome(&self, job: Job) -> IterationOutcome {
        if job.state == JobState::Dead {
            warn!(
                job_id = %job.id,
                worker_id = %self.worker_id(),
                attempts = job.attempts,
                "Job moved to DLQ"
            );
            IterationOutcome::DeadLettered {
                job_id: job.id,
                attempts: job.attempts,
            }
        } else {
            info!(
                job_id = %job.id,
                worker_id = %self.worker_id(),
                attempts = job.attempts,
                max_retries = job.max_retries,
                next_retry_at = ?job.next_retry_at,
                "Retry scheduled"
            );
            IterationOutcome::RetryScheduled {
                job_id: job.id,
                attempts: job.attempts,
                next_retry_at: job.next_retry_at,
            }
        }
    }

    /// Sleep for `millis`, waking early if the shutdown flag changes.
    async fn pause(millis: u64, shutdown: &mut watch::Receiver<bool>) {
        let delay = Duration::from_millis(millis);
        tokio::select! {
            _ = time::sleep(delay) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    // Sender gone: nothing can wake us early any more.
                    time::sleep(delay).await;
                }
            }
        }
    }
}
