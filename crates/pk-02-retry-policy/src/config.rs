//! Retry policy configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How many times, and how patiently, to retry a failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry. Doubles for each further retry.
    pub base_delay_ms: u64,
    /// Upper bound on any single delay.
    pub max_delay_ms: u64,
    /// Also retry non-OK response codes. Off by default.
    #[serde(default)]
    pub retry_result_not_okay: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            retry_result_not_okay: false,
        }
    }
}

impl RetryPolicy {
    /// Fast policy for tests.
    pub fn for_testing() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 10,
            retry_result_not_okay: false,
        }
    }

    /// Single attempt, never retry.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}
