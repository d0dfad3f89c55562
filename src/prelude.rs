//! Commonly used types.

pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{Error, Result};
pub use crate::executor::{Task, TaskId, WorkerId};
pub use crate::runner::Runner;
pub use crate::signal::{CancellationToken, InterruptHandle};
pub use crate::telemetry::MetricsSnapshot;
