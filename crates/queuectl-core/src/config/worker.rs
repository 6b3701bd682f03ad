//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Worker process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Idle sleep in milliseconds after a poll that claimed nothing.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Number of candidates fetched per poll.
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    /// Sleep in milliseconds after a store error before the next poll.
    #[serde(default = "default_error_backoff")]
    pub error_backoff_ms: u64,
    /// File recording the PIDs of workers started by the CLI.
    #[serde(default = "default_pid_file")]
    pub pid_file: String,
    /// Explicit worker identity (defaults to `worker-<pid>`).
    #[serde(default)]
    pub worker_id: Option<String>,
    /// Path of the worker executable spawned by `worker start`.
    #[serde(default)]
    pub binary: Option<String>,
}

impl WorkerConfig {
    /// Resolve the identity this process leases jobs under.
    pub fn resolve_worker_id(&self) -> String {
        self.worker_id
            .clone()
            .unwrap_or_else(|| format!("worker-{}", std::process::id()))
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            batch_size: default_batch_size(),
            error_backoff_ms: default_error_backoff(),
            pid_file: default_pid_file(),
            worker_id: None,
            binary: None,
        }
    }
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_batch_size() -> i64 {
    10
}

fn default_error_backoff() -> u64 {
    1000
}

fn default_pid_file() -> String {
    ".worker-pids".to_string()
}
