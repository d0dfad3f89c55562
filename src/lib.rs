//! Bounded-time task runner
//!
//! Executes a fixed set of independent tasks on a small pool of worker
//! threads and ends the run under exactly one of three conditions: every
//! task completed, a wall-clock deadline elapsed, or an interrupt (SIGINT by
//! default) arrived.
//!
//! # Quick Start
//!
//! ```no_run
//! use bounded_runner::prelude::*;
//! use std::time::Duration;
//!
//! let mut runner = Runner::new(Duration::from_secs(3), 3).unwrap();
//! runner
//!     .add_all(["A", "B", "C"].map(|name| {
//!         Task::named(name, move |worker| println!("{} on worker {}", name, worker))
//!     }))
//!     .unwrap();
//!
//! if let Err(e) = runner.start() {
//!     eprintln!("terminating: {}", e);
//! }
//! ```
//!
//! # Semantics
//!
//! - Each task is claimed by exactly one worker, at most once.
//! - Workers check for cancellation before every claim; a task that is
//!   already running is never preempted.
//! - The deadline only stops the caller from waiting. Tasks in flight when
//!   it passes keep running in the background.
//! - A panicking task takes its worker down with it; the runner does not
//!   isolate task failures.

// Lint configuration
#![warn(missing_docs, missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod runner;
pub mod signal;
pub mod telemetry;

// Re-export key types at crate root
pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use executor::{Task, TaskId, WorkerId};
pub use runner::Runner;
pub use signal::{CancellationToken, InterruptHandle};
pub use telemetry::MetricsSnapshot;
