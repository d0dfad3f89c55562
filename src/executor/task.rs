//! Task representation and execution.

use std::fmt;

/// Identity handed to every task: the index of the worker running it.
pub type WorkerId = usize;

/// Registration index of a task within its runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) usize);

impl TaskId {
    /// Position of the task in registration order.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A unit of work executed exactly once by some worker.
pub struct Task {
    pub(crate) id: TaskId,
    name: Option<String>,
    func: Box<dyn FnOnce(WorkerId) + Send + 'static>,
}

impl Task {
    /// Create an unnamed task
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(WorkerId) + Send + 'static,
    {
        Task {
            id: TaskId(0),
            name: None,
            func: Box::new(f),
        }
    }

    /// Create a task with a name used in log output
    pub fn named<S, F>(name: S, f: F) -> Self
    where
        S: Into<String>,
        F: FnOnce(WorkerId) + Send + 'static,
    {
        Task {
            id: TaskId(0),
            name: Some(name.into()),
            func: Box::new(f),
        }
    }

    /// Registration index, assigned when the run starts.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Name given at creation, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Label for logs: the name if one was given, the id otherwise.
    pub(crate) fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.id.to_string(),
        }
    }

    pub(crate) fn execute(self, worker: WorkerId) {
        (self.func)(worker);
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
