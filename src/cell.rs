//! Implements the listenable completion cell

use crate::{
    error::{Error, GetError},
    future::{Interrupt, SyncFuture},
    listener::{Listener, Registration},
    outcome::Outcome,
};
use crossbeam_queue::SegQueue;
use log::{debug, trace, warn};
use std::{
    fmt::{self, Debug, Formatter},
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{fence, AtomicBool, Ordering::SeqCst},
        Arc,
    },
    thread,
    time::Duration,
};

/// Something that can be run as a computation
pub trait Task: Send + Sync {
    /// Runs the computation
    fn run(&self) -> Result<(), Error>;
}

/// A run-once future that notifies listeners about its completion
///
/// Listeners can be added at any time from any thread; each of them is fired exactly once, either by the thread that
/// completes the cell or directly by the registering thread if the cell is already complete.
pub struct CompletionCell<T, E> {
    /// The underlying future that holds the outcome
    future: SyncFuture<T, E>,
    /// Whether the outcome has been published to the listeners
    done: AtomicBool,
    /// Listeners that wait for the completion
    listeners: SegQueue<Arc<Registration<T, E>>>,
}
impl<T, E> CompletionCell<T, E> {
    /// Creates a new cell for `computation`
    pub fn new<F>(computation: F) -> Self
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        Self::with_future(SyncFuture::new(computation))
    }
    /// Creates a new cell for a `computation` that observes the interrupt flag
    pub fn interruptible<F>(computation: F) -> Self
    where
        F: FnOnce(&Interrupt) -> Result<T, E> + Send + 'static,
    {
        Self::with_future(SyncFuture::interruptible(computation))
    }
    /// Creates a new cell that runs `runnable` and then succeeds with `value`
    pub fn with_value<F>(runnable: F, value: T) -> Self
    where
        F: FnOnce() + Send + 'static,
        T: Send + 'static,
    {
        Self::new(move || {
            runnable();
            Ok(value)
        })
    }
    /// Creates a new cell without computation that can only be completed by hand
    pub(crate) fn unset() -> Self {
        Self::with_future(SyncFuture::unset())
    }

    /// Creates a new cell around `future`
    fn with_future(future: SyncFuture<T, E>) -> Self {
        Self { future, done: AtomicBool::new(false), listeners: SegQueue::new() }
    }

    /// Adds a listener that is fired once the cell is completed
    ///
    /// If the cell is already complete, the listener is fired immediately on the calling thread; otherwise it is fired
    /// by the thread that completes the cell. This call never blocks.
    pub fn add_listener<L>(&self, listener: L)
    where
        L: Listener<T, E> + 'static,
    {
        // Fire immediately if we are already done
        if self.done.load(SeqCst) {
            trace!("Firing listener on registration");
            return self.fire(Box::new(listener));
        }

        // Enqueue the listener
        let registration = Arc::new(Registration::new(Box::new(listener)));
        self.listeners.push(Arc::clone(&registration));
        fence(SeqCst);

        // Check again in case the completion drained the queue before we enqueued; if the drain already claimed our
        // registration, it fires the listener
        if self.done.load(SeqCst) {
            if let Some(listener) = registration.claim() {
                trace!("Firing listener after racing with completion");
                self.fire(listener);
            }
        }
    }

    /// Runs the computation and notifies all listeners
    ///
    /// If the computation panics, the cell is cancelled, the listeners are notified and the panic is resumed.
    pub fn run(&self) -> Result<(), Error> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.future.run())) {
            Ok(completed) => {
                if completed? {
                    self.publish();
                }
                Ok(())
            }
            Err(payload) => {
                if self.is_done() {
                    self.publish();
                }
                panic::resume_unwind(payload)
            }
        }
    }
    /// Cancels the cell and interrupts the computation if `may_interrupt` is set
    ///
    /// Returns `false` if the cell has already been completed.
    pub fn cancel(&self, may_interrupt: bool) -> bool {
        if !self.future.cancel(may_interrupt) {
            return false;
        }

        debug!("Cancelled future (may_interrupt: {may_interrupt})");
        self.publish();
        true
    }

    /// Completes the cell with `value`
    pub(crate) fn set_result(&self, value: T) -> Result<(), Error> {
        self.future.set_value(value)?;
        self.publish();
        Ok(())
    }
    /// Completes the cell with `error`
    pub(crate) fn set_error(&self, error: E) -> Result<(), Error> {
        self.future.set_error(error)?;
        self.publish();
        Ok(())
    }

    /// Whether the cell has been completed
    pub fn is_done(&self) -> bool {
        self.future.is_done()
    }
    /// Whether the cell has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.future.is_cancelled()
    }
    /// The current outcome
    pub fn outcome(&self) -> Outcome<&T, &E> {
        self.future.outcome()
    }

    /// Waits until the cell is completed and returns a copy of the value
    pub fn get(&self) -> Result<T, GetError<E>>
    where
        T: Clone,
        E: Clone,
    {
        self.future.get()
    }
    /// Waits until the cell is completed or the timeout is reached
    pub fn get_timeout(&self, timeout: Duration) -> Result<T, GetError<E>>
    where
        T: Clone,
        E: Clone,
    {
        self.future.get_timeout(timeout)
    }

    /// Marks the cell as done and fires all queued listeners
    fn publish(&self) {
        self.done.store(true, SeqCst);
        fence(SeqCst);

        // Drain until empty; registrations that arrive after this loop see `done` and fire themselves
        let (mut fired, mut first_panic) = (0usize, None);
        while let Some(registration) = self.listeners.pop() {
            if let Some(listener) = registration.claim() {
                // A panicking listener must not starve the remaining ones
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| self.fire(listener))) {
                    warn!("Listener panicked on completion");
                    first_panic.get_or_insert(payload);
                }
                fired += 1;
            }
        }
        trace!("Fired {fired} queued listeners on completion");

        // Forward the first listener panic once everybody has been notified
        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
    }

    /// Fires `listener` according to the terminal outcome
    fn fire(&self, listener: Box<dyn Listener<T, E>>) {
        match self.future.outcome() {
            Outcome::Succeeded(value) => listener.on_result(value),
            Outcome::Failed(error) => listener.on_error(error),
            Outcome::Cancelled => listener.on_cancelled(),
            Outcome::Pending => panic!("Listener fired before the future has been completed"),
        }
    }
}
impl<T, E> Task for CompletionCell<T, E>
where
    T: Send + Sync,
    E: Send + Sync,
{
    fn run(&self) -> Result<(), Error> {
        CompletionCell::run(self)
    }
}
impl<T, E> Debug for CompletionCell<T, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionCell")
            .field("future", &self.future)
            .field("done", &self.done.load(SeqCst))
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Creates a cell for `computation` and runs it on a new thread
pub fn spawn<T, E, F>(computation: F) -> Arc<CompletionCell<T, E>>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
    F: FnOnce() -> Result<T, E> + Send + 'static,
{
    // Create the cell
    let cell = Arc::new(CompletionCell::new(computation));

    // Spawn the computation
    let runner = Arc::clone(&cell);
    thread::spawn(move || {
        if let Err(e) = runner.run() {
            debug!("Spawned computation did not run: {e}");
        }
    });

    cell
}
