// worker thread stuff
use super::queue::TaskQueue;
use super::task::{Task, WorkerId};
use crate::signal::InterruptMonitor;
use crate::telemetry::Metrics;
use crossbeam_channel::Sender;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

/// How a worker left its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerExit {
    Drained,
    Cancelled,
}

pub(crate) struct Worker {
    pub id: WorkerId,
    queue: Arc<TaskQueue>,
    monitor: Arc<InterruptMonitor>,
    metrics: Arc<Metrics>,
    // to the aggregator
    drained_tx: Sender<WorkerId>,
    // straight to the race
    interrupt_tx: Sender<WorkerId>,
}

impl Worker {
    pub fn new(
        id: WorkerId,
        queue: Arc<TaskQueue>,
        monitor: Arc<InterruptMonitor>,
        metrics: Arc<Metrics>,
        drained_tx: Sender<WorkerId>,
        interrupt_tx: Sender<WorkerId>,
    ) -> Self {
        Self {
            id,
            queue,
            monitor,
            metrics,
            drained_tx,
            interrupt_tx,
        }
    }

    // main loop
    pub fn run(self) -> WorkerExit {
        loop {
            if self.monitor.observe() {
                debug!(worker = self.id, "cancellation observed, exiting");
                self.metrics.record_worker_cancelled();
                // bounded(1): only the first report matters
                let _ = self.interrupt_tx.try_send(self.id);
                return WorkerExit::Cancelled;
            }

            match self.queue.claim_next() {
                Some(task) => {
                    self.metrics.record_task_claimed();
                    self.execute_task(task);
                }
                None => {
                    debug!(worker = self.id, "queue drained");
                    self.metrics.record_worker_drained();
                    let _ = self.drained_tx.send(self.id);
                    return WorkerExit::Drained;
                }
            }
        }
    }

    // no timeout and no unwind isolation: a task owns its own failure modes
    fn execute_task(&self, task: Task) {
        let label = task.label();
        debug!(worker = self.id, task = %label, "claimed task");

        let start = Instant::now();
        task.execute(self.id);
        let elapsed = start.elapsed();

        self.metrics.record_task_completed(elapsed);
        trace!(worker = self.id, task = %label, ?elapsed, "task finished");
    }
}
