//! Deferred load tasks
//!
//! A [`LoadTask`] captures everything needed to load one asset but does no
//! work until a batch (or [`LoadTask::run`]) starts it. Tasks can wrap a
//! plain future, the first item of a stream, or a completion-handler style
//! loader through [`Completion`].

use crate::error::{LoadError, Result};
use crate::runtime::BoxFuture;
use futures::channel::oneshot;
use futures::{Stream, StreamExt};
use std::future::Future;

type StartFn<T> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T>> + Send>;

/// One deferred asset load
pub struct LoadTask<T> {
    label: String,
    start: StartFn<T>,
}

impl<T> std::fmt::Debug for LoadTask<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadTask")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> LoadTask<T> {
    /// Create a task from a closure producing the load future
    pub fn new<F, Fut>(label: impl Into<String>, start: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            label: label.into(),
            start: Box::new(move || Box::pin(start())),
        }
    }

    /// A task that resolves immediately
    pub fn ready(label: impl Into<String>, result: Result<T>) -> Self {
        Self::new(label, move || async move { result })
    }

    /// A task backed by a stream; its first item is the result
    ///
    /// A stream that ends without yielding fails with
    /// [`LoadError::FinishedWithoutValue`].
    pub fn from_stream<F, S>(label: impl Into<String>, start: F) -> Self
    where
        F: FnOnce() -> S + Send + 'static,
        S: Stream<Item = Result<T>> + Send + 'static,
    {
        Self::new(label, move || first_value(start()))
    }

    /// A task backed by a completion-handler loader
    ///
    /// `register` receives a [`Completion`] to resolve. Dropping it without
    /// resolving fails the task with [`LoadError::FinishedWithoutValue`].
    pub fn from_completion<F>(label: impl Into<String>, register: F) -> Self
    where
        F: FnOnce(Completion<T>) + Send + 'static,
    {
        Self::new(label, move || {
            let (tx, rx) = oneshot::channel();
            register(Completion { tx });
            async move { rx.await.unwrap_or(Err(LoadError::FinishedWithoutValue)) }
        })
    }

    /// Label used in logs and metrics
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Transform the loaded value
    pub fn map<U, F>(self, f: F) -> LoadTask<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let Self { label, start } = self;
        LoadTask::new(label, move || {
            let fut = start();
            async move { fut.await.map(f) }
        })
    }

    /// Start the task, returning its future
    pub fn start(self) -> BoxFuture<'static, Result<T>> {
        (self.start)()
    }

    /// Run the task on its own
    pub async fn run(self) -> Result<T> {
        self.start().await
    }
}

/// Resolve a stream to its first item
pub async fn first_value<S, T>(stream: S) -> Result<T>
where
    S: Stream<Item = Result<T>>,
{
    let mut stream = Box::pin(stream);
    match stream.next().await {
        Some(result) => result,
        None => {
            log::warn!("Loading failed: source finished without a value");
            Err(LoadError::FinishedWithoutValue)
        }
    }
}

/// The resolving end of a completion-handler task
#[derive(Debug)]
pub struct Completion<T> {
    tx: oneshot::Sender<Result<T>>,
}

impl<T> Completion<T> {
    /// Resolve with a loaded value
    pub fn succeed(self, value: T) {
        self.complete(Ok(value));
    }

    /// Resolve with an error
    pub fn fail(self, err: LoadError) {
        self.complete(Err(err));
    }

    /// Resolve with a result
    pub fn complete(self, result: Result<T>) {
        // The receiver is gone if the batch already failed; nothing to do.
        let _ = self.tx.send(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_task_is_deferred() {
        let started = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = started.clone();
        let task = LoadTask::new("lazy", move || {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
            async { Ok(1u32) }
        });

        assert!(!started.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(block_on(task.run()).unwrap(), 1);
        assert!(started.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn test_stream_first_value_wins() {
        let task = LoadTask::from_stream("stream", || {
            futures::stream::iter(vec![Ok(1u32), Ok(2u32)])
        });
        assert_eq!(block_on(task.run()).unwrap(), 1);
    }

    #[test]
    fn test_empty_stream_is_finished_without_value() {
        let task = LoadTask::<u32>::from_stream("empty", futures::stream::empty);
        assert!(matches!(
            block_on(task.run()),
            Err(LoadError::FinishedWithoutValue)
        ));
    }

    #[test]
    fn test_stream_error_is_verbatim() {
        let task = LoadTask::<u32>::from_stream("broken", || {
            futures::stream::iter(vec![Err(LoadError::UnsupportedFormat("obj".into()))])
        });
        match block_on(task.run()) {
            Err(LoadError::UnsupportedFormat(fmt)) => assert_eq!(fmt, "obj"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_completion_resolves() {
        let task = LoadTask::from_completion("callback", |done| done.succeed("mesh"));
        assert_eq!(block_on(task.run()).unwrap(), "mesh");
    }

    #[test]
    fn test_dropped_completion_is_finished_without_value() {
        let task = LoadTask::<u32>::from_completion("dropped", drop);
        assert!(matches!(
            block_on(task.run()),
            Err(LoadError::FinishedWithoutValue)
        ));
    }

    #[test]
    fn test_map_and_label() {
        let task = LoadTask::ready("seven", Ok(7u32)).map(|v| v * 2);
        assert_eq!(task.label(), "seven");
        assert_eq!(block_on(task.run()).unwrap(), 14);
    }
}
