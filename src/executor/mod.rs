//! Task execution infrastructure.
//!
//! This module provides the pieces a run is assembled from: the shared
//! task queue, the worker threads draining it, and the aggregator that
//! notices when every worker is done.

pub(crate) mod aggregator;
pub(crate) mod pool;
pub(crate) mod queue;
pub mod task;
pub(crate) mod worker;

pub(crate) use pool::WorkerPool;
pub(crate) use queue::TaskQueue;
pub use task::{Task, TaskId, WorkerId};
