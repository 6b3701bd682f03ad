//! Lease acquisition over a candidate snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use queuectl_core::result::AppResult;
use queuectl_database::JobStore;
use queuectl_entity::job::Job;

/// Claims at most one job per poll on behalf of a single worker.
#[derive(Debug, Clone)]
pub struct LeaseManager {
    store: Arc<dyn JobStore>,
    worker_id: String,
}

impl LeaseManager {
    /// Create a lease manager for `worker_id`.
    pub fn new(store: Arc<dyn JobStore>, worker_id: impl Into<String>) -> Self {
        Self {
            store,
            worker_id: worker_id.into(),
        }
    }

    /// The identity leases are taken under.
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Try each candidate in order and return the first one leased.
    ///
    /// A lost race is not an error; the next candidate is tried instead.
    pub async fn acquire(&self, candidates: Vec<Job>, now: DateTime<Utc>) -> AppResult<Option<Job>> {
        for job in candidates {
            if self
                .store
                .try_acquire_lease(&job.id, &self.worker_id, now)
                .await?
            {
                debug!(job_id = %job.id, worker_id = %self.worker_id, "Lease acquired");
                return Ok(Some(job));
            }
            debug!(job_id = %job.id, worker_id = %self.worker_id, "Lease lost to another worker");
        }
        Ok(None)
    }

    /// Release the lease held on `job_id`.
    pub async fn release(&self, job_id: &str) -> AppResult<()> {
        self.store.release_lease(job_id).await?;
        debug!(job_id, worker_id = %self.worker_id, "Lease released");
        Ok(())
    }
}
