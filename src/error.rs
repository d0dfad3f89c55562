//! Error types.

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything a runner can fail with, including the two run outcomes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The deadline elapsed before every worker drained the queue.
    #[error("received timeout")]
    Timeout,

    /// An interrupt was observed by a worker before the run completed.
    #[error("received interrupt")]
    Interrupt,

    /// `start` or `add` was called on a runner that already started.
    #[error("runner already started")]
    AlreadyStarted,

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Worker threads could not be set up.
    #[error("executor error: {0}")]
    Executor(String),

    /// Signal registration failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create an executor error
    pub fn executor<S: Into<String>>(msg: S) -> Self {
        Error::Executor(msg.into())
    }

    /// Whether this is the deadline outcome
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }

    /// Whether this is the interrupt outcome
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Error::Interrupt)
    }
}
