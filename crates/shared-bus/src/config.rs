//! Observer registry configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the observer registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Listeners not delivered to (or touched) for longer than this are
    /// evicted on the next dispatch pass.
    pub observer_timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            observer_timeout_secs: crate::DEFAULT_OBSERVER_TIMEOUT.as_secs(),
        }
    }
}

impl RegistryConfig {
    /// Short timeout for tests that exercise eviction.
    pub fn for_testing() -> Self {
        Self {
            observer_timeout_secs: 1,
        }
    }

    pub fn with_timeout_secs(observer_timeout_secs: u64) -> Self {
        Self {
            observer_timeout_secs,
        }
    }

    pub fn observer_timeout(&self) -> Duration {
        Duration::from_secs(self.observer_timeout_secs)
    }
}
