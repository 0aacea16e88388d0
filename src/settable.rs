//! Implements a listenable future that is completed by hand

use crate::{
    cell::{CompletionCell, Task},
    error::{Error, GetError},
    listener::Listener,
    outcome::Outcome,
};
use log::warn;
use std::{
    fmt::{self, Debug, Formatter},
    time::Duration,
};

/// A listenable future without computation; a producer sets the outcome explicitly
pub struct SettableFuture<T, E> {
    /// The underlying cell
    cell: CompletionCell<T, E>,
}
impl<T, E> SettableFuture<T, E> {
    /// Creates a new pending future
    pub fn new() -> Self {
        Self { cell: CompletionCell::unset() }
    }

    /// Completes the future with `value`
    ///
    /// Fails with [`Error::AlreadyCompleted`] if the future already holds an outcome; that outcome is kept then.
    pub fn set_result(&self, value: T) -> Result<(), Error> {
        self.cell.set_result(value)
    }
    /// Completes the future with `error`
    ///
    /// Fails with [`Error::AlreadyCompleted`] if the future already holds an outcome; that outcome is kept then.
    pub fn set_error(&self, error: E) -> Result<(), Error> {
        self.cell.set_error(error)
    }

    /// Adds a listener that is fired once the future is completed
    pub fn add_listener<L>(&self, listener: L)
    where
        L: Listener<T, E> + 'static,
    {
        self.cell.add_listener(listener)
    }
    /// Cancels the future
    ///
    /// Returns `false` if the future has already been completed.
    pub fn cancel(&self, may_interrupt: bool) -> bool {
        self.cell.cancel(may_interrupt)
    }

    /// Whether the future has been completed
    pub fn is_done(&self) -> bool {
        self.cell.is_done()
    }
    /// Whether the future has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cell.is_cancelled()
    }
    /// The current outcome
    pub fn outcome(&self) -> Outcome<&T, &E> {
        self.cell.outcome()
    }

    /// Waits until the future is completed and returns a copy of the value
    pub fn get(&self) -> Result<T, GetError<E>>
    where
        T: Clone,
        E: Clone,
    {
        self.cell.get()
    }
    /// Waits until the future is completed or the timeout is reached
    pub fn get_timeout(&self, timeout: Duration) -> Result<T, GetError<E>>
    where
        T: Clone,
        E: Clone,
    {
        self.cell.get_timeout(timeout)
    }
}
impl<T, E> Default for SettableFuture<T, E> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T, E> Task for SettableFuture<T, E>
where
    T: Send + Sync,
    E: Send + Sync,
{
    fn run(&self) -> Result<(), Error> {
        warn!("Attempted to run a settable future as a computation");
        Err(Error::Unsupported)
    }
}
impl<T, E> Debug for SettableFuture<T, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettableFuture").field("cell", &self.cell).finish()
    }
}
