//! The public runner.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::executor::{Task, TaskQueue, WorkerId, WorkerPool};
use crate::signal::{CancellationToken, InterruptHandle, InterruptMonitor};
use crate::telemetry::{Metrics, MetricsSnapshot};
use crossbeam_channel::{at, bounded, never, select};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Configured,
    Started,
}

/// Runs a set of tasks on a fixed worker pool until they all finish, the
/// deadline passes, or an interrupt arrives.
///
/// The deadline clock starts at construction. A runner is single-use: once
/// [`start`](Runner::start) has been called, further `start` or `add` calls
/// fail with [`Error::AlreadyStarted`].
///
/// ```no_run
/// use bounded_runner::{Error, Runner};
/// use std::time::Duration;
///
/// let mut runner = Runner::new(Duration::from_secs(3), 3).unwrap();
/// runner.add(|worker| println!("running on worker {}", worker)).unwrap();
///
/// match runner.start() {
///     Ok(()) => println!("done"),
///     Err(Error::Timeout) => std::process::exit(1),
///     Err(Error::Interrupt) => std::process::exit(2),
///     Err(e) => panic!("{}", e),
/// }
/// ```
pub struct Runner {
    config: Config,
    // None when the deadline lies beyond what `Instant` can represent
    deadline_at: Option<Instant>,
    pending: Vec<Task>,
    monitor: Arc<InterruptMonitor>,
    metrics: Arc<Metrics>,
    pool: Option<WorkerPool>,
    state: RunState,
}

impl Runner {
    /// Create a runner with the given deadline and worker count, watching
    /// SIGINT.
    pub fn new(deadline: Duration, num_workers: usize) -> Result<Self> {
        let config = Config::builder()
            .deadline(deadline)
            .num_workers(num_workers)
            .build()?;
        Self::with_config(config)
    }

    /// Create a runner from a full configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            deadline_at: Instant::now().checked_add(config.deadline),
            monitor: Arc::new(InterruptMonitor::new(config.signals.clone())),
            metrics: Arc::new(Metrics::new()),
            pending: Vec::new(),
            pool: None,
            state: RunState::Configured,
            config,
        })
    }

    /// Append one task.
    pub fn add<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(WorkerId) + Send + 'static,
    {
        self.add_all(std::iter::once(Task::new(f)))
    }

    /// Append tasks in order. Must happen before `start`.
    pub fn add_all<I>(&mut self, tasks: I) -> Result<()>
    where
        I: IntoIterator<Item = Task>,
    {
        if self.state != RunState::Configured {
            return Err(Error::AlreadyStarted);
        }

        let before = self.pending.len();
        self.pending.extend(tasks);
        self.metrics.record_tasks_added(self.pending.len() - before);
        Ok(())
    }

    /// Run every registered task and block until the first of completion,
    /// deadline or interrupt.
    ///
    /// Returns `Ok(())` when every worker drained the queue,
    /// [`Error::Timeout`] when the deadline passed first and
    /// [`Error::Interrupt`] when a worker observed an interrupt first.
    ///
    /// Tasks already running when `start` returns are not stopped; the
    /// remaining workers only stop claiming new ones.
    pub fn start(&mut self) -> Result<()> {
        if self.state != RunState::Configured {
            return Err(Error::AlreadyStarted);
        }

        // a failed registration leaves the runner untouched
        self.monitor.arm()?;

        self.state = RunState::Started;
        let queue = Arc::new(TaskQueue::new(std::mem::take(&mut self.pending)));
        let num_tasks = queue.len();

        let (interrupt_tx, interrupt_rx) = bounded(1);
        let (complete_tx, complete_rx) = bounded(1);
        let deadline = match self.deadline_at {
            Some(deadline_at) => at(deadline_at),
            None => never(),
        };

        let pool = WorkerPool::spawn(
            &self.config,
            queue,
            self.monitor.clone(),
            self.metrics.clone(),
            interrupt_tx.clone(),
            complete_tx.clone(),
        );
        let pool = match pool {
            Ok(pool) => pool,
            Err(e) => {
                self.monitor.disarm();
                return Err(e);
            }
        };
        info!(
            tasks = num_tasks,
            workers = pool.num_threads(),
            deadline = ?self.config.deadline,
            "run started"
        );
        self.pool = Some(pool);

        // Completion and interrupt exclude each other: the aggregator fires
        // only after every worker drained, and a drained worker never reports
        // an interrupt. The senders held here keep both receivers connected.
        let outcome = select! {
            recv(complete_rx) -> _ => Ok(()),
            recv(interrupt_rx) -> _ => Err(Error::Interrupt),
            recv(deadline) -> _ => Err(Error::Timeout),
        };
        drop((interrupt_tx, complete_tx));

        self.monitor.token().cancel();
        self.monitor.disarm();

        let snapshot = self.metrics.snapshot();
        match &outcome {
            Ok(()) => info!(completed = snapshot.tasks_completed, "run completed"),
            Err(e) => warn!(
                reason = %e,
                completed = snapshot.tasks_completed,
                in_flight = snapshot.tasks_in_flight(),
                unclaimed = snapshot.tasks_unclaimed(),
                "run aborted"
            ),
        }

        outcome
    }

    /// Block until every worker thread of a started run has exited.
    ///
    /// After a timeout or interrupt this waits for in-flight tasks; it
    /// returns immediately if the run was never started.
    pub fn join_workers(&mut self) {
        if let Some(pool) = self.pool.as_mut() {
            pool.join();
        }
    }

    /// Handle that interrupts this run as an OS signal would.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.monitor.handle()
    }

    /// Token cancelled once the run is decided or an interrupt is observed.
    /// Long tasks may capture it to stop early on their own.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.monitor.token()
    }

    /// Current progress counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Number of worker threads a run spawns.
    pub fn num_workers(&self) -> usize {
        self.config.worker_threads()
    }

    /// Configured deadline, measured from construction.
    pub fn deadline(&self) -> Duration {
        self.config.deadline
    }

    /// Whether `start` has been called successfully.
    pub fn is_started(&self) -> bool {
        self.state == RunState::Started
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("deadline", &self.config.deadline)
            .field("num_workers", &self.config.worker_threads())
            .field("pending", &self.pending.len())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn quiet_runner(deadline: Duration, workers: usize) -> Runner {
        let config = Config::builder()
            .deadline(deadline)
            .num_workers(workers)
            .ignore_os_signals()
            .build()
            .unwrap();
        Runner::with_config(config).unwrap()
    }

    #[test]
    fn test_new_validates() {
        assert!(matches!(
            Runner::new(Duration::from_secs(1), 0),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Runner::new(Duration::ZERO, 2),
            Err(Error::Config(_))
        ));

        let runner = Runner::new(Duration::from_secs(1), 2).unwrap();
        assert_eq!(runner.num_workers(), 2);
        assert_eq!(runner.deadline(), Duration::from_secs(1));
        assert!(!runner.is_started());
    }

    #[test]
    fn test_huge_deadline_never_fires() {
        assert!(Runner::new(Duration::MAX, 3).is_ok());

        let mut runner = quiet_runner(Duration::MAX, 2);
        assert!(runner.deadline_at.is_none());

        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..4 {
            let counter = counter.clone();
            runner
                .add(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        assert!(runner.start().is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_failed_signal_registration_keeps_tasks() {
        // far beyond any real signal number, so sigaction rejects it
        let config = Config::builder()
            .deadline(Duration::from_secs(5))
            .num_workers(1)
            .ignore_os_signals()
            .watch_signal(4096)
            .build()
            .unwrap();
        let mut runner = Runner::with_config(config).unwrap();
        runner.add(|_| {}).unwrap();
        runner.add(|_| {}).unwrap();

        assert!(matches!(runner.start(), Err(Error::Io(_))));
        assert!(!runner.is_started());
        assert_eq!(runner.pending.len(), 2);
        assert!(runner.add(|_| {}).is_ok());
        assert!(runner.pool.is_none());
    }

    #[test]
    fn test_start_runs_everything() {
        let mut runner = quiet_runner(Duration::from_secs(5), 2);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let counter = counter.clone();
            runner
                .add(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        assert!(runner.start().is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert_eq!(runner.metrics().tasks_completed, 5);
        assert_eq!(runner.metrics().workers_drained, 2);
    }

    #[test]
    fn test_runner_is_single_use() {
        let mut runner = quiet_runner(Duration::from_secs(5), 1);
        runner.start().unwrap();
        assert!(runner.is_started());

        assert!(matches!(runner.start(), Err(Error::AlreadyStarted)));
        assert!(matches!(runner.add(|_| {}), Err(Error::AlreadyStarted)));
    }

    #[test]
    fn test_deadline_counts_from_construction() {
        let mut runner = quiet_runner(Duration::from_millis(50), 1);
        runner
            .add(|_| thread::sleep(Duration::from_millis(500)))
            .unwrap();
        thread::sleep(Duration::from_millis(100));

        let begun = Instant::now();
        assert!(matches!(runner.start(), Err(Error::Timeout)));
        assert!(begun.elapsed() < Duration::from_millis(400));
    }

    #[test]
    fn test_join_workers_after_timeout() {
        let mut runner = quiet_runner(Duration::from_millis(50), 1);
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let done = done.clone();
            runner
                .add(move |_| {
                    thread::sleep(Duration::from_millis(150));
                    done.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        assert!(matches!(runner.start(), Err(Error::Timeout)));
        runner.join_workers();

        // the in-flight task finished, nothing new was claimed after timeout
        assert_eq!(done.load(Ordering::SeqCst), 1);
        let snapshot = runner.metrics();
        assert_eq!(snapshot.tasks_claimed, 1);
        assert_eq!(snapshot.workers_cancelled, 1);
    }

    #[test]
    fn test_task_can_watch_cancellation() {
        let mut runner = quiet_runner(Duration::from_millis(50), 1);
        let token = runner.cancellation_token();
        let polls = Arc::new(AtomicUsize::new(0));

        let polls_clone = polls.clone();
        runner
            .add(move |_| {
                while !token.is_cancelled() {
                    polls_clone.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                }
            })
            .unwrap();

        assert!(matches!(runner.start(), Err(Error::Timeout)));
        runner.join_workers();
        assert!(polls.load(Ordering::SeqCst) > 0);
        assert_eq!(runner.metrics().tasks_completed, 1);
    }
}
