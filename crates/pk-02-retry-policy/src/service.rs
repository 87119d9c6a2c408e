//! # Backoff Helper
//!
//! Retries an asynchronous action with exponential delays.
//!
//! The attempt counter survives across `run` calls and is reset only by an
//! explicit `reset()`. A helper that has used up its attempts refuses to call
//! the action again until reset.

use crate::config::RetryPolicy;
use crate::domain::decision::{decide, delay_for, RetryDecision};
use billing_telemetry::metrics::RETRY_ATTEMPTS;
use shared_types::{AbortReason, BillingError, Operation};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Backoff {
    policy: RetryPolicy,
    attempt: u32,
}

impl Backoff {
    /// A policy allowing zero attempts is treated as a single attempt.
    pub fn new(mut policy: RetryPolicy) -> Self {
        if policy.max_attempts == 0 {
            warn!("Retry policy allows no attempts, using one");
            policy.max_attempts = 1;
        }
        Self { policy, attempt: 0 }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Attempts made since creation or the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn remaining(&self) -> u32 {
        self.policy.max_attempts.saturating_sub(self.attempt)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Delay that would follow a failure of the attempt about to be made.
    pub fn next_delay(&self) -> Duration {
        delay_for(&self.policy, self.attempt)
    }

    /// Run `action` until it succeeds, fails with a non-retryable error, or
    /// the attempts run out.
    ///
    /// `action` receives the 0-based attempt number. On the last failed
    /// attempt the action's own error is returned. Calling `run` on an
    /// exhausted helper returns `Aborted { reason: RetriesExhausted }` without
    /// invoking the action.
    pub async fn run<T, F, Fut>(&mut self, operation: Operation, mut action: F) -> Result<T, BillingError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, BillingError>>,
    {
        loop {
            if self.is_exhausted() {
                RETRY_ATTEMPTS.with_label_values(&["exhausted"]).inc();
                return Err(BillingError::aborted(operation, AbortReason::RetriesExhausted));
            }

            let current = self.attempt;
            self.attempt += 1;

            let error = match action(current).await {
                Ok(value) => {
                    RETRY_ATTEMPTS.with_label_values(&["success"]).inc();
                    return Ok(value);
                }
                Err(error) => error,
            };

            if decide(&self.policy, &error) == RetryDecision::GiveUp {
                if error.is_security_event() {
                    warn!(operation = %operation, attempt = current, "Security failure, not retrying");
                } else {
                    debug!(operation = %operation, attempt = current, error = %error, "Not retryable");
                }
                RETRY_ATTEMPTS.with_label_values(&["gave_up"]).inc();
                return Err(error);
            }

            if self.is_exhausted() {
                debug!(operation = %operation, attempts = self.attempt, error = %error, "Out of attempts");
                RETRY_ATTEMPTS.with_label_values(&["gave_up"]).inc();
                return Err(error);
            }

            let delay = delay_for(&self.policy, current);
            debug!(
                operation = %operation,
                attempt = current,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying after failure"
            );
            RETRY_ATTEMPTS.with_label_values(&["retry"]).inc();
            tokio::time::sleep(delay).await;
        }
    }
}
