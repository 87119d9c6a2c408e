//! Executor modes and task types.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// A unit of asynchronous work.
pub type Task = BoxFuture<'static, ()>;

/// A caller-visible callback delivery.
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// How the background executor schedules work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorMode {
    /// One worker runs tasks one after another in submission order.
    #[default]
    Serial,
    /// Every task runs concurrently on the runtime's worker pool.
    Pooled,
}

/// Counters exposed for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutorStats {
    pub submitted: u64,
    pub completed: u64,
    pub panicked: u64,
}

impl ExecutorStats {
    /// Tasks submitted but not finished yet.
    pub fn pending(&self) -> u64 {
        self.submitted.saturating_sub(self.completed + self.panicked)
    }
}
