//! Aggregate queue statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::status::JobState;

/// Job counts per state plus the average completed duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Total number of jobs.
    pub total: i64,
    /// Count of jobs per state; every state is present.
    pub by_state: BTreeMap<JobState, i64>,
    /// Mean duration of completed jobs in milliseconds (0 when none).
    pub avg_duration_ms: f64,
}

impl QueueStats {
    /// Build stats from raw per-state counts, zero-filling missing states.
    pub fn from_counts(
        counts: impl IntoIterator<Item = (JobState, i64)>,
        avg_duration_ms: Option<f64>,
    ) -> Self {
        let mut by_state: BTreeMap<JobState, i64> =
            JobState::ALL.iter().map(|state| (*state, 0)).collect();
        for (state, count) in counts {
            *by_state.entry(state).or_insert(0) += count;
        }
        let total = by_state.values().sum();
        Self {
            total,
            by_state,
            avg_duration_ms: avg_duration_ms.unwrap_or(0.0),
        }
    }

    /// Count for a single state.
    pub fn count(&self, state: JobState) -> i64 {
        self.by_state.get(&state).copied().unwrap_or(0)
    }

    /// Share of `state` in the total, as a percentage.
    pub fn percentage(&self, state: JobState) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(state) as f64 * 100.0 / self.total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_filled() {
        let stats = QueueStats::from_counts(vec![(JobState::Dead, 2)], None);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.count(JobState::Pending), 0);
        assert_eq!(stats.by_state.len(), 5);
        assert_eq!(stats.avg_duration_ms, 0.0);
    }

    #[test]
    fn test_percentage() {
        let stats = QueueStats::from_counts(
            vec![(JobState::Completed, 3), (JobState::Pending, 1)],
            Some(120.0),
        );
        assert_eq!(stats.percentage(JobState::Completed), 75.0);
        assert_eq!(stats.percentage(JobState::Failed), 0.0);
    }
}
