//! Exponential backoff and the Failed-vs-Dead decision.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on a single backoff delay (about 100 years).
const MAX_DELAY_SECONDS: i64 = 100 * 365 * 24 * 60 * 60;

/// What to do with a job after a failed execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RetryDecision {
    /// Keep the job in `Failed` until `next_retry_at`.
    Retry {
        /// Attempts after this failure.
        attempts: i32,
        /// When the job becomes eligible again.
        next_retry_at: DateTime<Utc>,
    },
    /// Retries are exhausted; move the job to `Dead`.
    DeadLetter {
        /// Attempts after this failure.
        attempts: i32,
    },
}

/// Pure retry policy: `delay = backoff_base ^ attempts` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    backoff_base: u32,
}

impl RetryPolicy {
    /// Backoff base used when the config table has no usable value.
    pub const DEFAULT_BACKOFF_BASE: u32 = 2;

    /// Create a policy with the given base.
    pub fn new(backoff_base: u32) -> Self {
        Self { backoff_base }
    }

    /// Build a policy from a raw config value, falling back to the default
    /// when the value is absent or not a non-negative integer.
    pub fn from_config_value(raw: Option<&str>) -> Self {
        let base = raw
            .and_then(|value| value.trim().parse::<u32>().ok())
            .unwrap_or(Self::DEFAULT_BACKOFF_BASE);
        Self::new(base)
    }

    /// The configured base.
    pub fn backoff_base(&self) -> u32 {
        self.backoff_base
    }

    /// Delay before attempt number `attempts + 1` may run.
    pub fn delay(&self, attempts: i32) -> Duration {
        let exponent = attempts.max(0) as u32;
        let seconds = i64::from(self.backoff_base)
            .checked_pow(exponent)
            .map_or(MAX_DELAY_SECONDS, |s| s.min(MAX_DELAY_SECONDS));
        Duration::seconds(seconds)
    }

    /// When a job that has failed `attempts` times becomes eligible again.
    pub fn next_retry_at(&self, attempts: i32, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.delay(attempts))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Decide the fate of a job whose execution just failed.
    ///
    /// `attempts_before` is the count stored on the job before this failure;
    /// the returned decision carries the incremented count.
    pub fn decide(
        &self,
        attempts_before: i32,
        max_retries: i32,
        now: DateTime<Utc>,
    ) -> RetryDecision {
        let attempts = attempts_before.saturating_add(1);
        if attempts <= max_retries {
            RetryDecision::Retry {
                attempts,
                next_retry_at: self.next_retry_at(attempts, now),
            }
        } else {
            RetryDecision::DeadLetter { attempts }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BACKOFF_BASE)
    }
}
