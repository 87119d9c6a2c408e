//! # Domain Layer
//!
//! Connection session bookkeeping. Pure state, no I/O and no executors.

pub mod errors;
pub mod session;
