//! Shared test helpers for integration tests.

use std::sync::Arc;

use queuectl_core::config::WorkerConfig;
use queuectl_database::{JobStore, MemoryJobStore};
use queuectl_entity::job::{Job, NewJob};
use queuectl_worker::{JobQueue, WorkerRunner};

/// Queue over a fresh in-process store.
pub struct TestQueue {
    /// Raw store access for assertions
    pub store: Arc<dyn JobStore>,
    /// Queue service shared by runners
    pub queue: Arc<JobQueue>,
}

impl TestQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryJobStore::new()))
    }

    /// Queue over a caller-supplied store
    pub fn with_store(store: Arc<dyn JobStore>) -> Self {
        let queue = Arc::new(JobQueue::new(Arc::clone(&store)));
        Self { store, queue }
    }

    /// A runner leasing under `worker_id`
    pub fn runner(&self, worker_id: &str) -> WorkerRunner {
        let config = WorkerConfig {
            worker_id: Some(worker_id.to_string()),
            poll_interval_ms: 10,
            error_backoff_ms: 10,
            ..WorkerConfig::default()
        };
        WorkerRunner::new(Arc::clone(&self.queue), config)
    }

    /// Enqueue a job, panicking on failure
    pub async fn enqueue(&self, new: NewJob) -> Job {
        self.queue.enqueue(new).await.expect("enqueue failed")
    }

    /// Current stored copy of a job
    pub async fn job(&self, id: &str) -> Job {
        self.queue
            .get(id)
            .await
            .expect("lookup failed")
            .expect("job missing")
    }
}
