use super::aggregator::Aggregator;
use super::queue::TaskQueue;
use super::task::WorkerId;
use super::worker::{Worker, WorkerExit};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::signal::InterruptMonitor;
use crate::telemetry::Metrics;
use crossbeam_channel::{unbounded, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::warn;

/// Fixed set of worker threads plus the aggregator watching them.
///
/// Threads are detached from the caller's wait: dropping the pool does not
/// join them, since an in-flight task may outlive the run.
pub(crate) struct WorkerPool {
    workers: Vec<JoinHandle<WorkerExit>>,
    aggregator: Option<JoinHandle<bool>>,
}

impl WorkerPool {
    pub fn spawn(
        config: &Config,
        queue: Arc<TaskQueue>,
        monitor: Arc<InterruptMonitor>,
        metrics: Arc<Metrics>,
        interrupt_tx: Sender<WorkerId>,
        complete_tx: Sender<()>,
    ) -> Result<Self> {
        let num_workers = config.worker_threads();
        let (drained_tx, drained_rx) = unbounded();

        let aggregator = Aggregator::new(num_workers, drained_rx, complete_tx);
        let aggregator = thread::Builder::new()
            .name(format!("{}-aggregator", config.thread_name_prefix))
            .spawn(move || aggregator.run())
            .map_err(|e| Error::executor(format!("aggregator spawn failed: {}", e)))?;

        let mut workers = Vec::with_capacity(num_workers);

        for id in 0..num_workers {
            let worker = Worker::new(
                id,
                queue.clone(),
                monitor.clone(),
                metrics.clone(),
                drained_tx.clone(),
                interrupt_tx.clone(),
            );

            let name = format!("{}-{}", config.thread_name_prefix, id);
            let mut builder = thread::Builder::new().name(name);
            if let Some(stack_size) = config.stack_size {
                builder = builder.stack_size(stack_size);
            }

            match builder.spawn(move || worker.run()) {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // let the workers already running wind down
                    monitor.token().cancel();
                    return Err(Error::executor(format!(
                        "worker {} spawn failed: {}",
                        id, e
                    )));
                }
            }
        }

        Ok(Self {
            workers,
            aggregator: Some(aggregator),
        })
    }

    pub fn num_threads(&self) -> usize {
        self.workers.len()
    }

    /// Block until every worker and the aggregator have exited.
    pub fn join(&mut self) -> Vec<Option<WorkerExit>> {
        let exits = self
            .workers
            .drain(..)
            .enumerate()
            .map(|(id, handle)| match handle.join() {
                Ok(exit) => Some(exit),
                Err(_) => {
                    warn!(worker = id, "worker thread panicked");
                    None
                }
            })
            .collect();

        if let Some(aggregator) = self.aggregator.take() {
            let _ = aggregator.join();
        }

        exits
    }
}
