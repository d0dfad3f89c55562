//! Runner configuration.

use crate::error::{Error, Result};
use signal_hook::consts::SIGINT;
use std::os::raw::c_int;
use std::time::Duration;

const MAX_WORKERS: usize = 1024;

/// Settings for a [`Runner`](crate::Runner).
#[derive(Debug, Clone)]
pub struct Config {
    /// Wall-clock budget, counted from runner construction.
    pub deadline: Duration,
    /// Worker threads to spawn; `None` uses the number of CPUs.
    pub num_workers: Option<usize>,
    /// Stack size of each worker thread.
    pub stack_size: Option<usize>,
    /// Worker threads are named `{prefix}-{id}`.
    pub thread_name_prefix: String,

    /// OS signals treated as an interrupt while a run is in progress.
    /// Empty means only an [`InterruptHandle`](crate::InterruptHandle) can interrupt.
    pub signals: Vec<c_int>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(60),
            num_workers: None,
            stack_size: Some(2 * 1024 * 1024),
            thread_name_prefix: "runner-worker".to_string(),
            signals: vec![SIGINT],
        }
    }
}

impl Config {
    /// Start building a configuration from the defaults.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Check the configuration for invalid values.
    pub fn validate(&self) -> Result<()> {
        if self.deadline.is_zero() {
            return Err(Error::config("deadline must be > 0"));
        }

        if let Some(n) = self.num_workers {
            if n == 0 {
                return Err(Error::config("num_workers must be > 0"));
            }
            if n > MAX_WORKERS {
                return Err(Error::config(format!(
                    "num_workers too large (max {})",
                    MAX_WORKERS
                )));
            }
        }

        if self.thread_name_prefix.contains('\0') {
            return Err(Error::config("thread_name_prefix must not contain NUL"));
        }

        Ok(())
    }

    /// Number of worker threads a run will spawn.
    pub fn worker_threads(&self) -> usize {
        self.num_workers
            .unwrap_or_else(|| num_cpus::get().min(MAX_WORKERS))
    }
}

/// Builder for [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a builder holding the default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Set the deadline.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.config.deadline = deadline;
        self
    }

    /// Set the number of worker threads.
    pub fn num_workers(mut self, n: usize) -> Self {
        self.config.num_workers = Some(n);
        self
    }

    /// Set the worker thread stack size in bytes.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Set the worker thread name prefix.
    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    /// Also treat `signal` as an interrupt.
    pub fn watch_signal(mut self, signal: c_int) -> Self {
        if !self.config.signals.contains(&signal) {
            self.config.signals.push(signal);
        }
        self
    }

    /// Watch no OS signals at all.
    pub fn ignore_os_signals(mut self) -> Self {
        self.config.signals.clear();
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
