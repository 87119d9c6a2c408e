//! Errors raised while assembling a connection. Operation failures are
//! `shared_types::BillingError` and go to callbacks instead.

use pk_01_task_executors::ExecutorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectionSetupError {
    #[error("Executor setup failed: {0}")]
    Executor(#[from] ExecutorError),
}
