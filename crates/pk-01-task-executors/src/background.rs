//! # Background Executor
//!
//! Runs I/O-bound work off the main context.
//!
//! - `Serial`: one worker drains an unbounded queue, so tasks run strictly one
//!   after another in submission order.
//! - `Pooled`: every task is spawned onto the runtime; no ordering between
//!   tasks.

use crate::domain::entities::{ExecutorMode, ExecutorStats, Task};
use crate::domain::errors::ExecutorError;
use crate::ports::inbound::TaskExecutor;
use crate::worker::{run_guarded, Counters};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::debug;

const SERIAL_NAME: &str = "background-serial";
const POOLED_NAME: &str = "background-pooled";

pub struct BackgroundExecutor {
    mode: ExecutorMode,
    handle: Handle,
    /// Queue feeding the serial worker. `None` in pooled mode or after shutdown.
    serial_tx: Mutex<Option<mpsc::UnboundedSender<Task>>>,
    accepting: AtomicBool,
    counters: Arc<Counters>,
}

impl BackgroundExecutor {
    /// Create an executor on the current tokio runtime.
    ///
    /// # Errors
    /// `ExecutorError::NoRuntime` when called outside a runtime.
    pub fn new(mode: ExecutorMode) -> Result<Self, ExecutorError> {
        let handle = Handle::try_current().map_err(|_| ExecutorError::NoRuntime)?;
        Ok(Self::with_handle(mode, handle))
    }

    /// Create an executor on an explicit runtime.
    pub fn with_handle(mode: ExecutorMode, handle: Handle) -> Self {
        let counters = Arc::new(Counters::default());

        let serial_tx = match mode {
            ExecutorMode::Serial => {
                let (tx, mut rx) = mpsc::unbounded_channel::<Task>();
                let worker_counters = counters.clone();
                handle.spawn(async move {
                    while let Some(task) = rx.recv().await {
                        run_guarded(task, &worker_counters, SERIAL_NAME).await;
                    }
                    debug!(executor = SERIAL_NAME, "Worker stopped");
                });
                Some(tx)
            }
            ExecutorMode::Pooled => None,
        };

        Self {
            mode,
            handle,
            serial_tx: Mutex::new(serial_tx),
            accepting: AtomicBool::new(true),
            counters,
        }
    }

    pub fn mode(&self) -> ExecutorMode {
        self.mode
    }
}

impl TaskExecutor for BackgroundExecutor {
    fn execute(&self, task: Task) -> Result<(), ExecutorError> {
        if !self.accepting.load(Ordering::Acquire) {
            return Err(ExecutorError::ShutDown(self.name()));
        }

        match self.mode {
            ExecutorMode::Serial => {
                let guard = self.serial_tx.lock();
                let tx = guard
                    .as_ref()
                    .ok_or(ExecutorError::ShutDown(SERIAL_NAME))?;
                tx.send(task)
                    .map_err(|_| ExecutorError::WorkerGone(SERIAL_NAME))?;
            }
            ExecutorMode::Pooled => {
                let counters = self.counters.clone();
                self.handle.spawn(async move {
                    run_guarded(task, &counters, POOLED_NAME).await;
                });
            }
        }
        self.counters.submitted();
        Ok(())
    }

    fn shutdown(&self) {
        self.accepting.store(false, Ordering::Release);
        // Dropping the sender lets the serial worker drain and exit.
        self.serial_tx.lock().take();
        debug!(executor = self.name(), "Shut down");
    }

    fn stats(&self) -> ExecutorStats {
        self.counters.snapshot()
    }

    fn name(&self) -> &'static str {
        match self.mode {
            ExecutorMode::Serial => SERIAL_NAME,
            ExecutorMode::Pooled => POOLED_NAME,
        }
    }
}
