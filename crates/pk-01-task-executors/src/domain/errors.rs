//! Executor errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// Construction was attempted outside a tokio runtime.
    #[error("No tokio runtime available")]
    NoRuntime,

    /// The executor was shut down; the task was not accepted.
    #[error("Executor {0} is shut down")]
    ShutDown(&'static str),

    /// The worker task ended unexpectedly.
    #[error("Executor {0} worker is gone")]
    WorkerGone(&'static str),
}
