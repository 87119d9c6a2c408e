//! # Billing Connection Configuration

use pk_01_task_executors::ExecutorMode;
use pk_02_retry_policy::RetryPolicy;
use pk_03_signature_verification::VerificationMode;
use serde::{Deserialize, Serialize};
use shared_types::SecurityCheck;
use std::time::Duration;

/// Billing API version this client speaks.
pub const DEFAULT_API_VERSION: u32 = 3;
/// First service API version that accepts dynamic price tokens.
pub const DYNAMIC_PRICE_API_VERSION: u32 = 8;
/// First service API version that answers trial subscription checks.
pub const TRIAL_SUBSCRIPTION_API_VERSION: u32 = 9;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Whether purchases are verified, and with which key.
    pub security_check: SecurityCheck,

    /// API version sent with every request.
    pub api_version: u32,

    /// Oldest service API version we accept at bind time.
    pub min_supported_api_version: u32,

    pub dynamic_price_api_version: u32,

    pub trial_subscription_api_version: u32,

    /// Bound on every remote call except waiting for the user to finish a
    /// purchase.
    pub operation_timeout_ms: u64,

    /// Upper bound on continuation pages followed by one purchase query.
    pub max_query_pages: usize,

    pub background_mode: ExecutorMode,

    pub verification_mode: VerificationMode,

    /// Backoff for fetching purchase query pages.
    pub query_retry: RetryPolicy,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            security_check: SecurityCheck::Disabled,
            api_version: DEFAULT_API_VERSION,
            min_supported_api_version: DEFAULT_API_VERSION,
            dynamic_price_api_version: DYNAMIC_PRICE_API_VERSION,
            trial_subscription_api_version: TRIAL_SUBSCRIPTION_API_VERSION,
            operation_timeout_ms: 30_000,
            max_query_pages: 20,
            background_mode: ExecutorMode::Serial,
            verification_mode: VerificationMode::Strict,
            query_retry: RetryPolicy::default(),
        }
    }
}

impl BillingConfig {
    /// Short timeouts and fast retries.
    pub fn for_testing() -> Self {
        Self {
            operation_timeout_ms: 500,
            max_query_pages: 5,
            query_retry: RetryPolicy::for_testing(),
            ..Self::default()
        }
    }

    pub fn with_security_check(mut self, security_check: SecurityCheck) -> Self {
        self.security_check = security_check;
        self
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}
