//! # Domain Layer
//!
//! Executor modes, task types and errors.

pub mod entities;
pub mod errors;
