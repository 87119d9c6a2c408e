//! # Main-Context Executor
//!
//! A single serialized consumer that every caller-visible callback is
//! delivered on. Jobs run strictly one at a time in submission order, so a
//! callback never runs concurrently with another callback.

use crate::domain::entities::{Callback, ExecutorStats, Task};
use crate::domain::errors::ExecutorError;
use crate::ports::inbound::TaskExecutor;
use crate::worker::{run_guarded, Counters};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

const NAME: &str = "main-context";

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

tokio::task_local! {
    static CURRENT_CONTEXT: u64;
}

enum Job {
    Callback(Callback),
    Task(Task),
    Flush(oneshot::Sender<()>),
}

pub struct MainContextExecutor {
    id: u64,
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    counters: Arc<Counters>,
}

impl MainContextExecutor {
    /// Create the main context on the current tokio runtime.
    ///
    /// # Errors
    /// `ExecutorError::NoRuntime` when called outside a runtime.
    pub fn new() -> Result<Self, ExecutorError> {
        let handle = Handle::try_current().map_err(|_| ExecutorError::NoRuntime)?;
        Ok(Self::with_handle(handle))
    }

    pub fn with_handle(handle: Handle) -> Self {
        let id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
        let counters = Arc::new(Counters::default());
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        let worker_counters = counters.clone();
        handle.spawn(CURRENT_CONTEXT.scope(id, async move {
            while let Some(job) = rx.recv().await {
                match job {
                    Job::Callback(callback) => match catch_unwind(AssertUnwindSafe(callback)) {
                        Ok(()) => worker_counters.completed(),
                        Err(_) => {
                            warn!(executor = NAME, "Callback panicked");
                            worker_counters.panicked();
                        }
                    },
                    Job::Task(task) => run_guarded(task, &worker_counters, NAME).await,
                    Job::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!(executor = NAME, context = id, "Worker stopped");
        }));

        Self {
            id,
            sender: Mutex::new(Some(tx)),
            counters,
        }
    }

    /// Queue a callback for delivery on the main context.
    pub fn post<F>(&self, callback: F) -> Result<(), ExecutorError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.send(Job::Callback(Box::new(callback)))?;
        self.counters.submitted();
        Ok(())
    }

    /// Resolve once every job submitted before this call has run.
    pub async fn flush(&self) -> Result<(), ExecutorError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(Job::Flush(done_tx))?;
        done_rx.await.map_err(|_| ExecutorError::WorkerGone(NAME))
    }

    /// Whether the caller is running on this main context.
    pub fn is_current(&self) -> bool {
        CURRENT_CONTEXT
            .try_with(|current| *current == self.id)
            .unwrap_or(false)
    }

    fn send(&self, job: Job) -> Result<(), ExecutorError> {
        let guard = self.sender.lock();
        let tx = guard.as_ref().ok_or(ExecutorError::ShutDown(NAME))?;
        tx.send(job).map_err(|_| ExecutorError::WorkerGone(NAME))
    }
}

impl TaskExecutor for MainContextExecutor {
    fn execute(&self, task: Task) -> Result<(), ExecutorError> {
        self.send(Job::Task(task))?;
        self.counters.submitted();
        Ok(())
    }

    fn shutdown(&self) {
        self.sender.lock().take();
    }

    fn stats(&self) -> ExecutorStats {
        self.counters.snapshot()
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
