//! Observability for runs.
//!
//! Progress counters are an addition to the runner's outcome: `start` still
//! reports only success, timeout or interrupt, but a [`MetricsSnapshot`]
//! shows how far the run got, including tasks that finish after `start`
//! has already returned.

pub mod metrics;

pub use metrics::{Metrics, MetricsSnapshot};
