//! Job entity model.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use queuectl_core::error::AppError;
use queuectl_core::result::AppResult;

use super::status::JobState;

/// A queued shell job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Job {
    /// Unique job identifier (client-supplied or generated UUID).
    pub id: String,
    /// Shell command to execute.
    pub command: String,
    /// Current lifecycle state.
    pub state: JobState,
    /// Scheduling priority (higher runs first).
    pub priority: i32,
    /// Number of failed executions so far.
    pub attempts: i32,
    /// Retry ceiling.
    pub max_retries: i32,
    /// Wall-clock limit for one execution, in milliseconds.
    pub timeout_ms: i64,
    /// Earliest time the job may run (None = immediately).
    pub run_at: Option<DateTime<Utc>>,
    /// Worker currently holding the lease.
    pub locked_by: Option<String>,
    /// When the lease was taken.
    pub locked_at: Option<DateTime<Utc>>,
    /// When a failed job becomes eligible again.
    pub next_retry_at: Option<DateTime<Utc>>,
    /// Captured stdout of the successful execution.
    pub output: Option<String>,
    /// Last failure message.
    pub error: Option<String>,
    /// Duration of the successful execution, in milliseconds.
    pub duration_ms: Option<i64>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job last entered processing.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the job was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Build a fresh pending job from a submission.
    pub fn from_new(id: String, new: &NewJob, now: DateTime<Utc>) -> Self {
        Self {
            id,
            command: new.command.clone(),
            state: JobState::Pending,
            priority: new.priority,
            attempts: 0,
            max_retries: new.max_retries,
            timeout_ms: new.timeout_ms,
            run_at: new.run_at,
            locked_by: None,
            locked_at: None,
            next_retry_at: None,
            output: None,
            error: None,
            duration_ms: None,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
        }
    }

    /// The execution timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(0) as u64)
    }

    /// Whether a worker may lease this job at `now`.
    ///
    /// Mirrors the candidate filter: pending or retry-due failed, unlocked,
    /// and not deferred past `now`.
    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        let state_ok = match self.state {
            JobState::Pending => true,
            JobState::Failed => self.next_retry_at.is_some_and(|at| at <= now),
            _ => false,
        };
        state_ok && self.locked_by.is_none() && self.run_at.is_none_or(|at| at <= now)
    }
}

/// A job submission.
///
/// Optional fields are filled from a fixed defaults table:
///
/// | field         | default  |
/// |---------------|----------|
/// | `max_retries` | 3        |
/// | `priority`    | 0        |
/// | `timeout_ms`  | 30000    |
/// | `run_at`      | none     |
/// | `id`          | UUID v4  |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJob {
    /// Client-supplied id; rejected if it already exists.
    #[serde(default)]
    pub id: Option<String>,
    /// Shell command to execute.
    pub command: String,
    /// Retry ceiling.
    #[serde(default = "default_max_retries")]
    pub max_retries: i32,
    /// Scheduling priority.
    #[serde(default)]
    pub priority: i32,
    /// Execution timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: i64,
    /// Deferred start time.
    #[serde(default)]
    pub run_at: Option<DateTime<Utc>>,
}

impl NewJob {
    /// Default retry ceiling.
    pub const DEFAULT_MAX_RETRIES: i32 = 3;
    /// Default priority.
    pub const DEFAULT_PRIORITY: i32 = 0;
    /// Default execution timeout in milliseconds.
    pub const DEFAULT_TIMEOUT_MS: i64 = 30_000;

    /// Create a submission for `command` with every default applied.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            id: None,
            command: command.into(),
            max_retries: Self::DEFAULT_MAX_RETRIES,
            priority: Self::DEFAULT_PRIORITY,
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
            run_at: None,
        }
    }

    /// Use a client-supplied id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the retry ceiling.
    pub fn with_max_retries(mut self, max_retries: i32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the execution timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as i64;
        self
    }

    /// Defer the job until `run_at`.
    pub fn with_run_at(mut self, run_at: DateTime<Utc>) -> Self {
        self.run_at = Some(run_at);
        self
    }

    /// Check the submission before it reaches the store.
    pub fn validate(&self) -> AppResult<()> {
        if self.command.trim().is_empty() {
            return Err(AppError::invalid_command());
        }
        if self.id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err(AppError::validation("Job id cannot be empty"));
        }
        if self.max_retries < 0 {
            return Err(AppError::validation("max_retries cannot be negative"));
        }
        if self.timeout_ms <= 0 {
            return Err(AppError::validation("timeout must be positive"));
        }
        Ok(())
    }
}

fn default_max_retries() -> i32 {
    NewJob::DEFAULT_MAX_RETRIES
}

fn default_timeout_ms() -> i64 {
    NewJob::DEFAULT_TIMEOUT_MS
}
