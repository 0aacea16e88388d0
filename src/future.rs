//! Implements the synchronous, run-once future

use crate::{
    error::{Error, GetError},
    outcome::Outcome,
};
use log::{debug, warn};
use std::{
    fmt::{self, Debug, Formatter},
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering::SeqCst},
        Arc, Condvar, Mutex, OnceLock,
    },
    thread::{self, Thread},
    time::{Duration, Instant},
};

/// A boxed computation
type Computation<T, E> = Box<dyn FnOnce(&Interrupt) -> Result<T, E> + Send>;

/// An interrupt flag that is raised if the future is cancelled with `may_interrupt` while the computation runs
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    /// The flag
    flag: Arc<AtomicBool>,
}
impl Interrupt {
    /// Whether the computation has been asked to stop
    pub fn is_set(&self) -> bool {
        self.flag.load(SeqCst)
    }

    /// Raises the flag
    fn raise(&self) {
        self.flag.store(true, SeqCst);
    }
}

/// A synchronous single-assignment future that runs its computation at most once
pub struct SyncFuture<T, E> {
    /// The signal variable
    signal: Condvar,
    /// Serializes the transition out of `Pending` against waiting threads
    guard: Mutex<()>,
    /// The terminal outcome
    outcome: OnceLock<Outcome<T, E>>,
    /// The computation; taken by the first `run`
    computation: Mutex<Option<Computation<T, E>>>,
    /// The thread that currently runs the computation
    runner: Mutex<Option<Thread>>,
    /// The interrupt flag passed to the computation
    interrupt: Interrupt,
}
impl<T, E> SyncFuture<T, E> {
    /// Creates a new future for `computation`
    pub fn new<F>(computation: F) -> Self
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        Self::interruptible(move |_: &Interrupt| computation())
    }
    /// Creates a new future for a `computation` that observes the interrupt flag
    pub fn interruptible<F>(computation: F) -> Self
    where
        F: FnOnce(&Interrupt) -> Result<T, E> + Send + 'static,
    {
        Self::with_computation(Some(Box::new(computation)))
    }
    /// Creates a new future without computation that can only be completed by hand
    pub fn unset() -> Self {
        Self::with_computation(None)
    }

    /// Creates a new future
    fn with_computation(computation: Option<Computation<T, E>>) -> Self {
        Self {
            signal: Condvar::new(),
            guard: Mutex::default(),
            outcome: OnceLock::new(),
            computation: Mutex::new(computation),
            runner: Mutex::default(),
            interrupt: Interrupt::default(),
        }
    }

    /// Runs the computation and stores its result
    ///
    /// Returns `Ok(true)` if this call completed the future, or `Ok(false)` if the future was cancelled while the
    /// computation ran; the result is discarded then. If the computation panics, the future is cancelled and the panic
    /// is resumed.
    pub fn run(&self) -> Result<bool, Error> {
        // Claim the computation
        let computation = self.computation.lock().expect("The future is poisoned?!").take();
        let Some(computation) = computation else {
            return Err(Error::AlreadyStarted);
        };

        // A future that has been cancelled before it started never runs
        if self.is_done() {
            return Err(Error::AlreadyCompleted);
        }

        // Run the computation and register ourselves as runner in the meantime
        *self.runner.lock().expect("The future is poisoned?!") = Some(thread::current());
        let result = panic::catch_unwind(AssertUnwindSafe(|| computation(&self.interrupt)));
        *self.runner.lock().expect("The future is poisoned?!") = None;

        // A panicking computation cancels the future so that waiting threads are released
        let result = match result {
            Ok(result) => result,
            Err(payload) => {
                warn!("Computation panicked; cancelling the future");
                let _ = self.complete(Outcome::Cancelled);
                panic::resume_unwind(payload);
            }
        };

        // Store the result
        match self.complete(result.into()) {
            Ok(_) => Ok(true),
            Err(_) => {
                debug!("Discarding the result of a computation that has been cancelled while running");
                Ok(false)
            }
        }
    }

    /// Sets the value
    pub fn set_value(&self, value: T) -> Result<(), Error> {
        self.complete(Outcome::Succeeded(value))
    }
    /// Sets the error
    pub fn set_error(&self, error: E) -> Result<(), Error> {
        self.complete(Outcome::Failed(error))
    }

    /// Cancels the future and interrupts the computation if `may_interrupt` is set
    ///
    /// Returns `false` if the future has already been completed.
    pub fn cancel(&self, may_interrupt: bool) -> bool {
        if self.complete(Outcome::Cancelled).is_err() {
            return false;
        }

        // Interrupt the runner if requested
        if may_interrupt {
            self.interrupt.raise();
            if let Some(runner) = self.runner.lock().expect("The future is poisoned?!").as_ref() {
                runner.unpark();
            }
        }
        true
    }

    /// Whether the future holds a terminal outcome
    pub fn is_done(&self) -> bool {
        self.outcome.get().is_some()
    }
    /// Whether the future has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.outcome().is_cancelled()
    }
    /// The current outcome
    pub fn outcome(&self) -> Outcome<&T, &E> {
        match self.outcome.get() {
            Some(outcome) => outcome.as_ref(),
            None => Outcome::Pending,
        }
    }

    /// Waits until the future is completed and returns a copy of the value
    pub fn get(&self) -> Result<T, GetError<E>>
    where
        T: Clone,
        E: Clone,
    {
        // Wait for the future if necessary
        let mut guard = self.guard.lock().expect("The future is poisoned?!");
        while !self.is_done() {
            // Wait until we are signalled again
            guard = self.signal.wait(guard).expect("The future is poisoned?!");
        }

        drop(guard);
        Self::retrieve(self.outcome())
    }
    /// Waits until the future is completed or the timeout is reached
    pub fn get_timeout(&self, timeout: Duration) -> Result<T, GetError<E>>
    where
        T: Clone,
        E: Clone,
    {
        // Compute an absolute deadline from the timeout; a deadline beyond the clock's range means waiting forever
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.get();
        };

        // Wait for the future if necessary
        let mut guard = self.guard.lock().expect("The future is poisoned?!");
        while !self.is_done() {
            // Compute the remaining time and wait until the timeout is reached or we are signalled
            let remaining = deadline.checked_duration_since(Instant::now()).unwrap_or_default();
            let (lock_result, timeout_result) =
                self.signal.wait_timeout(guard, remaining).expect("The future is poisoned?!");

            // Check if the timeout has been reached
            guard = lock_result;
            if timeout_result.timed_out() && !self.is_done() {
                return Err(GetError::Timeout);
            }
        }

        drop(guard);
        Self::retrieve(self.outcome())
    }

    /// Stores the terminal outcome and wakes all waiting threads
    fn complete(&self, outcome: Outcome<T, E>) -> Result<(), Error> {
        let _guard = self.guard.lock().expect("The future is poisoned?!");
        self.outcome.set(outcome).map_err(|_| Error::AlreadyCompleted)?;
        self.signal.notify_all();
        Ok(())
    }

    /// Maps an outcome to a retrieval result
    fn retrieve(outcome: Outcome<&T, &E>) -> Result<T, GetError<E>>
    where
        T: Clone,
        E: Clone,
    {
        match outcome {
            Outcome::Succeeded(value) => Ok(value.clone()),
            Outcome::Failed(error) => Err(GetError::Failed(error.clone())),
            Outcome::Cancelled => Err(GetError::Cancelled),
            Outcome::Pending => Err(GetError::Timeout),
        }
    }
}
impl<T, E> Debug for SyncFuture<T, E> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        // Get a debug representation for the outcome
        let outcome: &dyn Debug = match self.outcome() {
            Outcome::Pending => &"Pending",
            Outcome::Succeeded(_) => &"Succeeded(<opaque>)",
            Outcome::Failed(_) => &"Failed(<opaque>)",
            Outcome::Cancelled => &"Cancelled",
        };

        // Debug-format the struct
        f.debug_struct("SyncFuture")
            .field("signal", &"<opaque>")
            .field("outcome", &outcome)
            .field("interrupt", &self.interrupt.is_set())
            .finish()
    }
}
