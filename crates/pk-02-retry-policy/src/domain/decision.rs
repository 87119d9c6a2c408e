//! Retry decisions.
//!
//! ```text
//! failure ──▶ PurchaseHijacked? ──yes──▶ GiveUp (always surfaced)
//!                  │ no
//!                  ▼
//!            ResultNotOkay? ──yes──▶ Retry only if the policy opts in
//!                  │ no                (never for a user cancellation)
//!                  ▼
//!            class == Temporary? ──▶ Retry / GiveUp
//! ```

use crate::config::RetryPolicy;
use shared_types::{BillingError, ErrorClass, ResponseCode};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    GiveUp,
}

/// Decide whether `error` may be retried under `policy`.
pub fn decide(policy: &RetryPolicy, error: &BillingError) -> RetryDecision {
    let retry = match error {
        BillingError::PurchaseHijacked => false,
        BillingError::ResultNotOkay { code } => {
            policy.retry_result_not_okay && *code != ResponseCode::UserCanceled
        }
        other => other.class() == ErrorClass::Temporary,
    };
    if retry {
        RetryDecision::Retry
    } else {
        RetryDecision::GiveUp
    }
}

/// Delay after failed attempt `attempt` (0-based): `base * 2^attempt`,
/// capped at the policy maximum.
pub fn delay_for(policy: &RetryPolicy, attempt: u32) -> Duration {
    let max = policy.max_delay();
    2u32.checked_pow(attempt)
        .and_then(|factor| policy.base_delay().checked_mul(factor))
        .map_or(max, |delay| delay.min(max))
}
