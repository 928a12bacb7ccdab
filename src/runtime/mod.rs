//! Async runtime abstraction
//!
//! The callback-style entry points need somewhere to run the batch future.
//! That place is an [`AsyncSpawner`], so the loader works with Tokio, with
//! the synchronous mock used in tests, or with any other executor.

pub mod mock;
#[cfg(feature = "runtime-tokio")]
pub mod tokio_impl;

use crate::error::Result;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A boxed future that can be sent across threads
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Handle to a spawned task
///
/// Dropping the handle detaches the task; [`TaskHandle::abort`] cancels it.
pub struct TaskHandle {
    finished: Arc<AtomicBool>,
    abort: Option<Box<dyn FnOnce() + Send>>,
}

impl TaskHandle {
    /// Create a handle from a completion flag and an abort hook
    pub fn new(finished: Arc<AtomicBool>, abort: impl FnOnce() + Send + 'static) -> Self {
        Self {
            finished,
            abort: Some(Box::new(abort)),
        }
    }

    /// Handle for a task that already ran to completion
    pub fn completed() -> Self {
        Self {
            finished: Arc::new(AtomicBool::new(true)),
            abort: None,
        }
    }

    /// Whether the task has run to completion
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Cancel the task if it hasn't finished
    pub fn abort(mut self) {
        if let Some(abort) = self.abort.take() {
            abort();
        }
    }
}

impl Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Wrap `task` so that `finished` flips once it completes
pub(crate) fn track_completion<F>(task: F) -> (Arc<AtomicBool>, impl Future<Output = ()>)
where
    F: Future<Output = ()>,
{
    let finished = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&finished);
    let tracked = async move {
        task.await;
        flag.store(true, Ordering::Release);
    };
    (finished, tracked)
}

/// Async task spawner trait
///
/// # Example
/// ```ignore
/// let spawner = TokioSpawner::new();
/// let handle = spawner.spawn(async {
///     // Async work here
/// });
/// ```
pub trait AsyncSpawner: Send + Sync + Clone + Debug {
    /// Spawn a detached task
    fn spawn<F>(&self, task: F) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static;

    /// Get the name of this runtime (for debugging)
    fn runtime_name(&self) -> &'static str;

    /// Block on a future (if supported by the runtime)
    ///
    /// Returns None if blocking is not supported.
    fn block_on<F, T>(&self, _future: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        None
    }
}

/// Run CPU-bound decoding off the async worker threads
///
/// Inside a Tokio runtime this goes through `spawn_blocking`, so a batch of
/// decodes really runs in parallel. Elsewhere the work runs inline.
#[cfg(feature = "runtime-tokio")]
pub async fn run_blocking<F, T>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    if tokio::runtime::Handle::try_current().is_err() {
        return work();
    }

    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(err) if err.is_cancelled() => Err(crate::error::LoadError::Cancelled),
        Err(err) => std::panic::resume_unwind(err.into_panic()),
    }
}

#[cfg(not(feature = "runtime-tokio"))]
pub async fn run_blocking<F, T>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    work()
}

pub use mock::{MockSpawnBehavior, MockSpawner};

#[cfg(feature = "runtime-tokio")]
pub use tokio_impl::TokioSpawner;
