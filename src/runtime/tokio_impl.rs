//! Tokio async runtime implementation

use super::{track_completion, AsyncSpawner, TaskHandle};
use std::future::Future;

/// Tokio-based async spawner
///
/// Spawns onto the runtime it was created in, or onto the ambient runtime
/// when built with [`TokioSpawner::new`].
#[derive(Clone, Debug, Default)]
pub struct TokioSpawner {
    handle: Option<tokio::runtime::Handle>,
}

impl TokioSpawner {
    /// Spawn onto whatever runtime is current at spawn time
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Spawn onto a specific runtime
    pub fn with_handle(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Capture the current runtime, if any
    pub fn current() -> Option<Self> {
        tokio::runtime::Handle::try_current()
            .ok()
            .map(Self::with_handle)
    }
}

impl AsyncSpawner for TokioSpawner {
    fn spawn<F>(&self, task: F) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (finished, tracked) = track_completion(task);
        let join = match &self.handle {
            Some(handle) => handle.spawn(tracked),
            None => tokio::spawn(tracked),
        };
        TaskHandle::new(finished, move || join.abort())
    }

    fn runtime_name(&self) -> &'static str {
        "Tokio"
    }

    fn block_on<F, T>(&self, future: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            // block_in_place panics on a current-thread runtime
            if handle.runtime_flavor() != tokio::runtime::RuntimeFlavor::MultiThread {
                return None;
            }
            Some(tokio::task::block_in_place(|| handle.block_on(future)))
        } else if let Some(handle) = &self.handle {
            Some(handle.block_on(future))
        } else {
            let rt = tokio::runtime::Runtime::new().ok()?;
            Some(rt.block_on(future))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_tokio_spawner() {
        let spawner = TokioSpawner::new();
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = ran.clone();

        let handle = spawner.spawn(async move {
            ran_clone.store(true, Ordering::SeqCst);
        });

        for _ in 0..50 {
            if handle.is_finished() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(ran.load(Ordering::SeqCst));
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_tokio_spawner_abort() {
        let spawner = TokioSpawner::new();
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = ran.clone();

        let handle = spawner.spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            ran_clone.store(true, Ordering::SeqCst);
        });
        handle.abort();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_tokio_block_on_outside_runtime() {
        let spawner = TokioSpawner::new();
        assert_eq!(spawner.block_on(async { 42u32 }), Some(42));
    }

    #[test]
    fn test_tokio_runtime_name() {
        assert_eq!(TokioSpawner::new().runtime_name(), "Tokio");
    }
}
