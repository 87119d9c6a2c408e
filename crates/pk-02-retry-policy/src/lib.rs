//! # Retry Policy (PK-02)
//!
//! Caller-opted-in recovery for temporary billing failures.
//!
//! ## Rules
//!
//! - Only failures classified `Temporary` are retried.
//! - `PurchaseHijacked` is a security event and is never retried.
//! - `ResultNotOkay` is retried only when the policy opts in.
//! - Delay after attempt `n` is `base * 2^n`, capped at `max_delay`.
//! - The attempt counter resets only on an explicit `reset()`.

pub mod config;
pub mod domain;
pub mod service;

pub use config::RetryPolicy;
pub use domain::decision::{decide, delay_for, RetryDecision};
pub use service::Backoff;
