//! Error types

use thiserror::Error;

/// A misuse of a future's lifecycle
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum Error {
    /// The future already holds a terminal outcome
    #[error("The future has already been completed")]
    AlreadyCompleted,
    /// The computation has already been taken by another `run` call
    #[error("The computation has already been started")]
    AlreadyStarted,
    /// The future is set by hand and cannot be run as a computation
    #[error("The future cannot be run as a computation")]
    Unsupported,
}

/// The reason why a blocking retrieval did not yield a value
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GetError<E> {
    /// The future has been cancelled
    #[error("The future has been cancelled")]
    Cancelled,
    /// The computation failed
    #[error("The computation failed: {0:?}")]
    Failed(E),
    /// The future was still pending when the timeout elapsed
    #[error("The future has not been completed in time")]
    Timeout,
}
