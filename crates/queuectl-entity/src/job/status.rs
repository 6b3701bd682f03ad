//! Job state enumeration and its transition graph.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use queuectl_core::error::AppError;

/// Lifecycle state of a job.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "job_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Waiting to be claimed by a worker.
    Pending,
    /// Claimed and currently executing.
    Processing,
    /// Last execution failed; eligible again once `next_retry_at` passes.
    Failed,
    /// Finished successfully.
    Completed,
    /// Retries exhausted; only an operator re-queue leaves this state.
    Dead,
}

impl JobState {
    /// Every state, in display order.
    pub const ALL: [JobState; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Completed,
        Self::Failed,
        Self::Dead,
    ];

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// `Dead -> Pending` is only reachable through an explicit re-queue.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Failed, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
                | (Self::Processing, Self::Dead)
                | (Self::Dead, Self::Pending)
        )
    }

    /// States from which `next` may be entered.
    pub fn predecessors(next: JobState) -> Vec<JobState> {
        Self::ALL
            .into_iter()
            .filter(|state| state.can_transition_to(next))
            .collect()
    }

    /// Return the state as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Dead => "dead",
        }
    }

    /// Lowercase names of all states.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|s| s.as_str()).collect()
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobState {
    type Err = AppError;

    /// Parse a state name case-insensitively (`"DEAD"`, `"dead"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == lowered)
            .ok_or_else(|| AppError::invalid_state(s, &Self::names()))
    }
}
