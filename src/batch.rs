//! Ordered batch loading
//!
//! A batch starts every task at once, tags each with its input position and
//! collects results as they complete. The caller gets either every asset in
//! input order or the first failure observed. When several tasks fail close
//! together, which of their errors is reported is not defined.
//!
//! Failing fast drops the remaining futures, which cancels them.
//!
//! # Example
//! ```ignore
//! let tasks = names.iter().map(|name| loader.entity_task(name.as_str()));
//! let entities = load_many(tasks).await?;
//! ```

use crate::error::{LoadError, Result};
use crate::metrics::LoadMetrics;
use crate::runtime::{AsyncSpawner, TaskHandle};
use crate::task::LoadTask;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::time::{Duration, Instant};

/// Smallest batch accepted; single loads go through the single-asset path
pub const MIN_BATCH_SIZE: usize = 2;

/// Load every task concurrently, returning results in input order
///
/// Fails with [`LoadError::BatchTooSmall`] for fewer than two tasks and
/// with the first task error observed otherwise.
pub async fn load_many<T, I>(tasks: I) -> Result<Vec<T>>
where
    T: Send + 'static,
    I: IntoIterator<Item = LoadTask<T>>,
{
    run_batch(tasks.into_iter().collect(), None).await
}

/// Callback form of [`load_many`]
///
/// The batch runs on `spawner`; exactly one of `on_success` and `on_error`
/// is called unless the returned handle is aborted first.
pub fn load_many_with<T, I, S, OnSuccess, OnError>(
    spawner: &S,
    tasks: I,
    on_success: OnSuccess,
    on_error: OnError,
) -> TaskHandle
where
    T: Send + 'static,
    I: IntoIterator<Item = LoadTask<T>>,
    S: AsyncSpawner,
    OnSuccess: FnOnce(Vec<T>) + Send + 'static,
    OnError: FnOnce(LoadError) + Send + 'static,
{
    let tasks: Vec<_> = tasks.into_iter().collect();
    spawner.spawn(async move { deliver(load_many(tasks).await, on_success, on_error) })
}

/// Callback form of a single load
pub fn load_one_with<T, S, OnSuccess, OnError>(
    spawner: &S,
    task: LoadTask<T>,
    on_success: OnSuccess,
    on_error: OnError,
) -> TaskHandle
where
    T: Send + 'static,
    S: AsyncSpawner,
    OnSuccess: FnOnce(T) + Send + 'static,
    OnError: FnOnce(LoadError) + Send + 'static,
{
    spawner.spawn(async move { deliver(task.run().await, on_success, on_error) })
}

pub(crate) fn deliver<T, OnSuccess, OnError>(
    result: Result<T>,
    on_success: OnSuccess,
    on_error: OnError,
) where
    OnSuccess: FnOnce(T),
    OnError: FnOnce(LoadError),
{
    match result {
        Ok(value) => on_success(value),
        Err(err) => {
            log::error!("Error loading asset: {err}");
            on_error(err)
        }
    }
}

/// The shared fan-out/fan-in behind every batch entry point
pub(crate) async fn run_batch<T>(
    tasks: Vec<LoadTask<T>>,
    metrics: Option<&LoadMetrics>,
) -> Result<Vec<T>>
where
    T: Send + 'static,
{
    let len = tasks.len();
    if len < MIN_BATCH_SIZE {
        log::warn!("Batch loads need at least {MIN_BATCH_SIZE} requests, got {len}");
        return Err(LoadError::BatchTooSmall { len });
    }

    log::debug!("Starting batch of {len} loads");
    let batch_start = Instant::now();

    let mut in_flight: FuturesUnordered<_> = tasks
        .into_iter()
        .enumerate()
        .map(|(index, task)| {
            let label = task.label().to_string();
            if let Some(metrics) = metrics {
                metrics.record_load_started();
            }
            let load = task.start();
            async move {
                let started = Instant::now();
                let result = load.await;
                (index, label, started.elapsed(), result)
            }
        })
        .collect();

    // Loads still in flight when this returns early or is dropped count as
    // cancelled, so started == succeeded + failed + cancelled.
    let mut pending = PendingLoads::new(metrics, len);

    let mut slots: Vec<Option<T>> = (0..len).map(|_| None).collect();
    while let Some((index, label, elapsed, result)) = in_flight.next().await {
        pending.finished_one();
        if let Some(metrics) = metrics {
            metrics.record_load_finished(&label, elapsed, result.is_ok());
        }

        match result {
            Ok(value) => {
                log::debug!("Loaded '{label}' ({}/{len}) in {elapsed:?}", index + 1);
                slots[index] = Some(value);
            }
            Err(err) => {
                log::warn!("Batch failed on '{label}' (request {index}): {err}");
                finish(metrics, batch_start.elapsed(), false);
                return Err(err);
            }
        }
    }

    finish(metrics, batch_start.elapsed(), true);
    log::debug!("Batch of {len} loads finished in {:?}", batch_start.elapsed());

    slots
        .into_iter()
        .collect::<Option<Vec<T>>>()
        .ok_or(LoadError::FinishedWithoutValue)
}

/// Counts started loads that never reported back
pub(crate) struct PendingLoads<'a> {
    metrics: Option<&'a LoadMetrics>,
    remaining: u64,
}

impl<'a> PendingLoads<'a> {
    pub(crate) fn new(metrics: Option<&'a LoadMetrics>, started: usize) -> Self {
        Self {
            metrics,
            remaining: started as u64,
        }
    }

    pub(crate) fn finished_one(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}

impl Drop for PendingLoads<'_> {
    fn drop(&mut self) {
        match self.metrics {
            Some(metrics) if self.remaining > 0 => {
                log::debug!("Dropping {} unfinished loads", self.remaining);
                metrics.record_loads_cancelled(self.remaining);
            }
            _ => {}
        }
    }
}

fn finish(metrics: Option<&LoadMetrics>, latency: Duration, succeeded: bool) {
    if let Some(metrics) = metrics {
        metrics.record_batch(latency, succeeded);
    }
}
