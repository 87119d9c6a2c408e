//! # Task Executors (PK-01)
//!
//! The two execution contexts every cross-boundary call passes through.
//!
//! ## Contexts
//!
//! - **Background** (`BackgroundExecutor`): binding, remote calls, parsing and
//!   verification. Serial (one worker, submission order) or pooled.
//! - **Main** (`MainContextExecutor`): one serialized consumer that delivers
//!   every caller-visible callback. Never blocked by I/O.
//!
//! Both implement [`TaskExecutor`] and are interchangeable wherever only the
//! submission contract matters.
//!
//! ## Runtime
//!
//! Executors spawn onto tokio. Constructing one outside a runtime returns
//! `ExecutorError::NoRuntime` instead of panicking.

pub mod background;
pub mod domain;
pub mod main_context;
pub mod ports;
mod worker;

pub use background::BackgroundExecutor;
pub use domain::entities::{Callback, ExecutorMode, ExecutorStats, Task};
pub use domain::errors::ExecutorError;
pub use main_context::MainContextExecutor;
pub use ports::inbound::TaskExecutor;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
