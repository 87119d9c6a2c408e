//! Shared worker plumbing: counters and panic containment.

use crate::domain::entities::{ExecutorStats, Task};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

#[derive(Debug, Default)]
pub(crate) struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    panicked: AtomicU64,
}

impl Counters {
    pub(crate) fn submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn panicked(&self) {
        self.panicked.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ExecutorStats {
        ExecutorStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }
}

/// Run `task` to completion. A panic is logged and counted; it never takes
/// the worker down with it.
pub(crate) async fn run_guarded(task: Task, counters: &Counters, executor: &'static str) {
    match AssertUnwindSafe(task).catch_unwind().await {
        Ok(()) => counters.completed(),
        Err(_) => {
            warn!(executor, "Task panicked");
            counters.panicked();
        }
    }
}
