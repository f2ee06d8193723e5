//! Bounded worker pool for minification tasks.
//!
//! Jobs are queued first-in first-out onto a fixed set of worker threads.
//! Each submission gets a [`TaskHandle`] whose [`TaskHandle::wait`] yields
//! that job's [`TaskOutcome`]; completion order across handles is not
//! defined, so callers correlate by handle, never by arrival.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver};
use minim_config::Parallelism;
use minim_diagnostics::RawMinifyError;

use crate::error::PipelineError;

/// Identifies a submitted task. The orchestrator uses the asset's position
/// in FILTER order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub usize);

/// How a task ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome<T> {
    /// The job returned a value.
    Completed(T),
    /// The job reported a minifier failure.
    Failed(RawMinifyError),
    /// The job panicked; the payload is captured as a message-only error.
    Panicked(RawMinifyError),
    /// The build was aborted before the job started, or the pool went away.
    Abandoned,
}

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    /// Creates a handle in the not-aborted state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests abort. Tasks that have not started yet are abandoned.
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once [`AbortHandle::abort`] has been called.
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clears the flag so the pool can be used for another build.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A pending task result.
pub struct TaskHandle<T> {
    id: TaskId,
    rx: Receiver<TaskOutcome<T>>,
}

impl<T> TaskHandle<T> {
    /// The id given at submission.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Blocks until the task finishes.
    pub fn wait(self) -> TaskOutcome<T> {
        self.rx.recv().unwrap_or(TaskOutcome::Abandoned)
    }
}

/// A fixed-size pool of worker threads.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    bound: usize,
    abort: AbortHandle,
}

impl WorkerPool {
    /// Starts a pool of `bound` workers.
    pub fn new(bound: usize) -> Result<Self, PipelineError> {
        if bound == 0 {
            return Err(PipelineError::NoWorkers);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(bound)
            .thread_name(|i| format!("minim-worker-{i}"))
            .build()
            .map_err(|e| PipelineError::PoolStart(e.to_string()))?;
        tracing::debug!(workers = bound, "worker pool started");
        Ok(Self {
            pool,
            bound,
            abort: AbortHandle::new(),
        })
    }

    /// Starts a pool sized by `parallel`.
    pub fn from_parallelism(parallel: Parallelism) -> Result<Self, PipelineError> {
        Self::new(parallel.bound())
    }

    /// The maximum number of jobs running at once.
    pub fn bound(&self) -> usize {
        self.bound
    }

    /// A handle that aborts this pool's pending tasks.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Queues `job` and returns immediately.
    pub fn submit<T, F>(&self, id: TaskId, job: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, RawMinifyError> + Send + 'static,
    {
        let (tx, rx) = bounded(1);
        let abort = self.abort.clone();
        self.pool.spawn_fifo(move || {
            let outcome = if abort.is_aborted() {
                TaskOutcome::Abandoned
            } else {
                match catch_unwind(AssertUnwindSafe(job)) {
                    Ok(Ok(value)) => TaskOutcome::Completed(value),
                    Ok(Err(raw)) => TaskOutcome::Failed(raw),
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        tracing::debug!(task = id.0, %message, "task panicked");
                        TaskOutcome::Panicked(RawMinifyError::message(message))
                    }
                }
            };
            // The receiver may have been dropped by an aborted caller.
            let _ = tx.send(outcome);
        });
        TaskHandle { id, rx }
    }

    /// Submits every job and waits for all of them.
    ///
    /// Outcomes are indexed by submission position regardless of the order
    /// jobs finish in.
    pub fn run_all<T, F>(&self, jobs: impl IntoIterator<Item = F>) -> Vec<TaskOutcome<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, RawMinifyError> + Send + 'static,
    {
        let handles: Vec<_> = jobs
            .into_iter()
            .enumerate()
            .map(|(i, job)| self.submit(TaskId(i), job))
            .collect();
        handles.into_iter().map(TaskHandle::wait).collect()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("minifier panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("minifier panicked: {s}")
    } else {
        "minifier panicked".to_string()
    }
}
