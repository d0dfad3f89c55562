// shared pending-task queue
use super::task::{Task, TaskId};
use crossbeam_deque::{Injector, Steal};

/// Pre-filled FIFO that hands out each task to exactly one claimer.
pub(crate) struct TaskQueue {
    injector: Injector<Task>,
    len: usize,
}

impl TaskQueue {
    /// Fill the queue, numbering tasks by their registration order.
    pub fn new(tasks: Vec<Task>) -> Self {
        let injector = Injector::new();
        let len = tasks.len();

        for (index, mut task) in tasks.into_iter().enumerate() {
            task.id = TaskId(index);
            injector.push(task);
        }

        Self { injector, len }
    }

    /// Remove and return the next unclaimed task, `None` once drained.
    pub fn claim_next(&self) -> Option<Task> {
        loop {
            match self.injector.steal() {
                Steal::Success(task) => return Some(task),
                Steal::Empty => return None,
                Steal::Retry => continue,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }
}
