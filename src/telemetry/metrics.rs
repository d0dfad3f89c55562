//! Progress counters for a single run.

use hdrhistogram::Histogram;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Run metrics collector, shared by the runner and its workers
#[derive(Debug)]
pub struct Metrics {
    tasks_added: AtomicU64,
    tasks_claimed: AtomicU64,
    tasks_completed: AtomicU64,
    workers_drained: AtomicU64,
    workers_cancelled: AtomicU64,

    // task durations in nanoseconds
    latency_histogram: RwLock<Option<Histogram<u64>>>,

    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        // 3 significant figures, up to one hour
        let histogram = Histogram::new_with_max(3_600_000_000_000, 3).ok();

        Self {
            tasks_added: AtomicU64::new(0),
            tasks_claimed: AtomicU64::new(0),
            tasks_completed: AtomicU64::new(0),
            workers_drained: AtomicU64::new(0),
            workers_cancelled: AtomicU64::new(0),
            latency_histogram: RwLock::new(histogram),
            start_time: Instant::now(),
        }
    }

    /// Record tasks registered with the runner
    pub fn record_tasks_added(&self, count: usize) {
        self.tasks_added.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record a task claimed by a worker
    pub fn record_task_claimed(&self) {
        self.tasks_claimed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished task and its duration
    pub fn record_task_completed(&self, duration: Duration) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);

        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        if let Some(hist) = self.latency_histogram.write().as_mut() {
            hist.saturating_record(nanos);
        }
    }

    /// Record a worker that found the queue empty
    pub fn record_worker_drained(&self) {
        self.workers_drained.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a worker that stopped on cancellation
    pub fn record_worker_cancelled(&self) {
        self.workers_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current snapshot of metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let histogram = self.latency_histogram.read();
        let (avg, p50, p99, max) = match histogram.as_ref() {
            Some(hist) if hist.len() > 0 => (
                hist.mean() as u64,
                hist.value_at_quantile(0.50),
                hist.value_at_quantile(0.99),
                hist.max(),
            ),
            _ => (0, 0, 0, 0),
        };

        MetricsSnapshot {
            uptime: self.start_time.elapsed(),
            tasks_added: self.tasks_added.load(Ordering::Relaxed),
            tasks_claimed: self.tasks_claimed.load(Ordering::Relaxed),
            tasks_completed: self.tasks_completed.load(Ordering::Relaxed),
            workers_drained: self.workers_drained.load(Ordering::Relaxed),
            workers_cancelled: self.workers_cancelled.load(Ordering::Relaxed),
            avg_task_ns: avg,
            p50_task_ns: p50,
            p99_task_ns: p99,
            max_task_ns: max,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of a run's progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Time since the runner was created
    pub uptime: Duration,
    /// Tasks registered
    pub tasks_added: u64,
    /// Tasks claimed by some worker
    pub tasks_claimed: u64,
    /// Tasks that returned
    pub tasks_completed: u64,
    /// Workers that exited on an empty queue
    pub workers_drained: u64,
    /// Workers that exited on cancellation
    pub workers_cancelled: u64,
    /// Mean task duration
    pub avg_task_ns: u64,
    /// Median task duration
    pub p50_task_ns: u64,
    /// 99th percentile task duration
    pub p99_task_ns: u64,
    /// Longest task duration
    pub max_task_ns: u64,
}

impl MetricsSnapshot {
    /// Tasks claimed but not yet finished
    pub fn tasks_in_flight(&self) -> u64 {
        self.tasks_claimed.saturating_sub(self.tasks_completed)
    }

    /// Tasks never claimed by any worker
    pub fn tasks_unclaimed(&self) -> u64 {
        self.tasks_added.saturating_sub(self.tasks_claimed)
    }
}
