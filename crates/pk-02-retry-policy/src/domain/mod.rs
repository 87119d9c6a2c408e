//! # Domain Layer
//!
//! Pure retry decisions and delay computation. No timers.

pub mod decision;
