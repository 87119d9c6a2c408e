//! # Inbound Ports
//!
//! The common contract of both executors.

use crate::domain::entities::{ExecutorStats, Task};
use crate::domain::errors::ExecutorError;

/// Accepts asynchronous work.
///
/// Submission never blocks and never runs the task inline.
pub trait TaskExecutor: Send + Sync {
    /// Queue `task` for execution.
    fn execute(&self, task: Task) -> Result<(), ExecutorError>;

    /// Stop accepting new work. Already queued tasks still run.
    fn shutdown(&self);

    fn stats(&self) -> ExecutorStats;

    /// Label used in logs.
    fn name(&self) -> &'static str;
}
