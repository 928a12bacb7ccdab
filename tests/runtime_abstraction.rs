//! Integration tests for async runtime abstraction

use archetype_loader::{
    load_one_with, AsyncSpawner, LoadError, LoadTask, MockSpawnBehavior, MockSpawner,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_mock_spawner_integration() {
    let spawner = MockSpawner::blocking();

    let executed = Arc::new(AtomicBool::new(false));
    let executed_clone = Arc::clone(&executed);

    let handle = spawner.spawn(async move {
        executed_clone.store(true, Ordering::SeqCst);
    });

    // In blocking mode, should execute immediately
    assert!(executed.load(Ordering::SeqCst));
    assert!(handle.is_finished());
}

#[test]
fn test_spawner_trait_bound() {
    fn spawn_task<S: AsyncSpawner>(spawner: &S) {
        spawner.spawn(async {});
    }

    let spawner = MockSpawner::new();
    spawn_task(&spawner);
}

#[test]
fn test_dropping_spawner_never_delivers() {
    let spawner = MockSpawner::with_behavior(MockSpawnBehavior::Drop);
    let calls = Arc::new(AtomicUsize::new(0));
    let (a, b) = (calls.clone(), calls.clone());

    let handle = load_one_with(
        &spawner,
        LoadTask::ready("robot", Ok(1)),
        move |_| {
            a.fetch_add(1, Ordering::SeqCst);
        },
        move |_| {
            b.fetch_add(1, Ordering::SeqCst);
        },
    );

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!handle.is_finished());
}

#[test]
fn test_deferred_single_load_reports_error() {
    let spawner = MockSpawner::deferred();
    let error = Arc::new(parking_lot::Mutex::new(None));
    let sink = error.clone();

    load_one_with(
        &spawner,
        LoadTask::<u32>::from_completion("robot", |done| drop(done)),
        |_| panic!("load should fail"),
        move |err| *sink.lock() = Some(err),
    );
    assert!(error.lock().is_none());

    spawner.run_pending();
    assert!(matches!(*error.lock(), Some(LoadError::FinishedWithoutValue)));
}

#[test]
fn test_aborted_deferred_task_is_skipped() {
    let spawner = MockSpawner::deferred();
    let executed = Arc::new(AtomicBool::new(false));
    let executed_clone = Arc::clone(&executed);

    let handle = spawner.spawn(async move {
        executed_clone.store(true, Ordering::SeqCst);
    });
    handle.abort();

    assert_eq!(spawner.run_pending(), 0);
    assert!(!executed.load(Ordering::SeqCst));
}

#[cfg(feature = "runtime-tokio")]
#[test]
fn test_tokio_spawner_block_on() {
    use archetype_loader::TokioSpawner;

    let spawner = TokioSpawner::new();
    assert_eq!(spawner.runtime_name(), "Tokio");
    assert_eq!(spawner.block_on(async { 21 * 2 }), Some(42));
}
