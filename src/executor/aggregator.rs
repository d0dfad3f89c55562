//! Completion aggregation.
//!
//! Counts "queue drained" reports, one per worker, and fires the completion
//! signal once every worker has reported. Workers that leave through the
//! interrupt path never report here; when all of them are gone the channel
//! disconnects and the aggregator exits without firing.

use super::task::WorkerId;
use crossbeam_channel::{Receiver, Sender};
use tracing::debug;

pub(crate) struct Aggregator {
    num_workers: usize,
    drained_rx: Receiver<WorkerId>,
    complete_tx: Sender<()>,
}

impl Aggregator {
    pub fn new(
        num_workers: usize,
        drained_rx: Receiver<WorkerId>,
        complete_tx: Sender<()>,
    ) -> Self {
        Self {
            num_workers,
            drained_rx,
            complete_tx,
        }
    }

    /// Returns whether completion was signaled.
    pub fn run(self) -> bool {
        let mut seen = vec![false; self.num_workers];
        let mut drained = 0;

        while drained < self.num_workers {
            let Ok(worker) = self.drained_rx.recv() else {
                debug!(
                    drained,
                    expected = self.num_workers,
                    "workers gone before completion"
                );
                return false;
            };

            match seen.get_mut(worker) {
                Some(slot) if !*slot => {
                    *slot = true;
                    drained += 1;
                }
                _ => debug!(worker, "ignoring duplicate or unknown drain report"),
            }
        }

        debug!(workers = self.num_workers, "all workers drained");
        // the race may already be decided and gone
        let _ = self.complete_tx.send(());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{bounded, unbounded};

    #[test]
    fn test_fires_after_every_worker() {
        let (drained_tx, drained_rx) = unbounded();
        let (complete_tx, complete_rx) = bounded(1);

        for id in [2, 0, 1] {
            drained_tx.send(id).unwrap();
        }

        assert!(Aggregator::new(3, drained_rx, complete_tx).run());
        assert_eq!(complete_rx.try_recv(), Ok(()));
    }

    #[test]
    fn test_duplicates_are_not_counted() {
        let (drained_tx, drained_rx) = unbounded();
        let (complete_tx, complete_rx) = bounded(1);

        drained_tx.send(0).unwrap();
        drained_tx.send(0).unwrap();
        drained_tx.send(7).unwrap();
        drop(drained_tx);

        assert!(!Aggregator::new(2, drained_rx, complete_tx).run());
        assert!(complete_rx.try_recv().is_err());
    }

    #[test]
    fn test_exits_when_workers_disconnect() {
        let (drained_tx, drained_rx) = unbounded::<WorkerId>();
        let (complete_tx, complete_rx) = bounded(1);

        drained_tx.send(1).unwrap();
        drop(drained_tx);

        assert!(!Aggregator::new(3, drained_rx, complete_tx).run());
        assert!(complete_rx.try_recv().is_err());
    }

    #[test]
    fn test_survives_closed_race() {
        let (drained_tx, drained_rx) = unbounded();
        let (complete_tx, complete_rx) = bounded(1);
        drop(complete_rx);

        drained_tx.send(0).unwrap();
        assert!(Aggregator::new(1, drained_rx, complete_tx).run());
    }
}
