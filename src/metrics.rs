use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Tracks counters and timings for loads and batches
#[derive(Debug, Default)]
pub struct LoadMetrics {
    load_times: RwLock<HashMap<String, Duration>>,
    loads_started: AtomicU64,
    loads_succeeded: AtomicU64,
    loads_failed: AtomicU64,
    loads_cancelled: AtomicU64,
    batches_completed: AtomicU64,
    batches_failed: AtomicU64,
    last_batch_latency: RwLock<Option<Duration>>,
}

impl LoadMetrics {
    /// Create a new instance of LoadMetrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a load was started
    pub fn record_load_started(&self) {
        self.loads_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished load and how long it took
    pub fn record_load_finished(&self, label: &str, duration: Duration, succeeded: bool) {
        if succeeded {
            self.loads_succeeded.fetch_add(1, Ordering::Relaxed);
            self.load_times.write().insert(label.to_string(), duration);
        } else {
            self.loads_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record loads that started but were dropped before finishing
    pub fn record_loads_cancelled(&self, count: u64) {
        self.loads_cancelled.fetch_add(count, Ordering::Relaxed);
    }

    /// Record the outcome of a whole batch
    pub fn record_batch(&self, latency: Duration, succeeded: bool) {
        if succeeded {
            self.batches_completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.batches_failed.fetch_add(1, Ordering::Relaxed);
        }
        *self.last_batch_latency.write() = Some(latency);
    }

    /// Loads started so far
    pub fn loads_started(&self) -> u64 {
        self.loads_started.load(Ordering::Relaxed)
    }

    /// Loads that produced a value
    pub fn loads_succeeded(&self) -> u64 {
        self.loads_succeeded.load(Ordering::Relaxed)
    }

    /// Loads that failed
    pub fn loads_failed(&self) -> u64 {
        self.loads_failed.load(Ordering::Relaxed)
    }

    /// Loads dropped unfinished, e.g. siblings of a failed batch request
    pub fn loads_cancelled(&self) -> u64 {
        self.loads_cancelled.load(Ordering::Relaxed)
    }

    /// Batches that delivered every asset
    pub fn batches_completed(&self) -> u64 {
        self.batches_completed.load(Ordering::Relaxed)
    }

    /// Batches that failed
    pub fn batches_failed(&self) -> u64 {
        self.batches_failed.load(Ordering::Relaxed)
    }

    /// Wall-clock time of the most recent batch
    pub fn last_batch_latency(&self) -> Option<Duration> {
        *self.last_batch_latency.read()
    }

    /// Share of finished loads that failed, as a percentage
    pub fn failure_rate(&self) -> f32 {
        let ok = self.loads_succeeded() as f32;
        let failed = self.loads_failed() as f32;

        if ok + failed > 0.0 {
            failed / (ok + failed) * 100.0
        } else {
            0.0
        }
    }

    /// Latest load time recorded for `label`
    pub fn load_time(&self, label: &str) -> Option<Duration> {
        self.load_times.read().get(label).cloned()
    }

    /// Get all recorded load times
    pub fn all_load_times(&self) -> HashMap<String, Duration> {
        self.load_times.read().clone()
    }
}

/// A thread-safe wrapper around LoadMetrics
#[derive(Debug, Clone, Default)]
pub struct LoadMetricsHandle(Arc<LoadMetrics>);

impl LoadMetricsHandle {
    /// Create a new metrics handle
    pub fn new() -> Self {
        Self(Arc::new(LoadMetrics::new()))
    }

    /// Get a reference to the underlying metrics
    pub fn inner(&self) -> &LoadMetrics {
        &self.0
    }
}

impl std::ops::Deref for LoadMetricsHandle {
    type Target = LoadMetrics;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
