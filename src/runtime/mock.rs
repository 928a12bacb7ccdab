//! Mock async spawner for testing
//!
//! Tasks can be dropped, run synchronously at spawn time, or queued and run
//! later with [`MockSpawner::run_pending`].

use super::{track_completion, AsyncSpawner, BoxFuture, TaskHandle};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Spawn behavior for MockSpawner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockSpawnBehavior {
    /// Drop tasks immediately (don't execute)
    Drop,
    /// Block on tasks synchronously using a simple executor
    BlockSync,
    /// Queue tasks until `run_pending` is called
    Deferred,
}

struct QueuedTask {
    cancelled: Arc<AtomicBool>,
    task: BoxFuture<'static, ()>,
}

/// Mock async spawner for testing
#[derive(Clone)]
pub struct MockSpawner {
    behavior: MockSpawnBehavior,
    queue: Arc<Mutex<Vec<QueuedTask>>>,
}

impl std::fmt::Debug for MockSpawner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSpawner")
            .field("behavior", &self.behavior)
            .field("pending", &self.pending())
            .finish()
    }
}

impl Default for MockSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSpawner {
    /// Create a new mock spawner that drops tasks
    pub fn new() -> Self {
        Self::with_behavior(MockSpawnBehavior::Drop)
    }

    /// Create a mock spawner with specific behavior
    pub fn with_behavior(behavior: MockSpawnBehavior) -> Self {
        Self {
            behavior,
            queue: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock spawner that runs tasks synchronously
    pub fn blocking() -> Self {
        Self::with_behavior(MockSpawnBehavior::BlockSync)
    }

    /// Create a mock spawner that queues tasks
    pub fn deferred() -> Self {
        Self::with_behavior(MockSpawnBehavior::Deferred)
    }

    /// Number of queued tasks
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Run every queued task to completion, skipping aborted ones
    ///
    /// Returns how many tasks actually ran.
    pub fn run_pending(&self) -> usize {
        let queued = std::mem::take(&mut *self.queue.lock());
        let mut ran = 0;
        for QueuedTask { cancelled, task } in queued {
            if cancelled.load(Ordering::Acquire) {
                continue;
            }
            futures::executor::block_on(task);
            ran += 1;
        }
        ran
    }
}

impl AsyncSpawner for MockSpawner {
    fn spawn<F>(&self, task: F) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self.behavior {
            MockSpawnBehavior::Drop => {
                drop(task);
                TaskHandle::new(Arc::new(AtomicBool::new(false)), || {})
            }
            MockSpawnBehavior::BlockSync => {
                futures::executor::block_on(task);
                TaskHandle::completed()
            }
            MockSpawnBehavior::Deferred => {
                let (finished, tracked) = track_completion(task);
                let cancelled = Arc::new(AtomicBool::new(false));
                self.queue.lock().push(QueuedTask {
                    cancelled: Arc::clone(&cancelled),
                    task: Box::pin(tracked),
                });
                TaskHandle::new(finished, move || cancelled.store(true, Ordering::Release))
            }
        }
    }

    fn runtime_name(&self) -> &'static str {
        "Mock"
    }

    fn block_on<F, T>(&self, future: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        match self.behavior {
            MockSpawnBehavior::Drop => None,
            MockSpawnBehavior::BlockSync | MockSpawnBehavior::Deferred => {
                Some(futures::executor::block_on(future))
            }
        }
    }
}
