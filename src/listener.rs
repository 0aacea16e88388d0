//! Completion listeners

use crate::outcome::Outcome;
use std::{
    fmt::{self, Debug, Formatter},
    sync::{Mutex, PoisonError},
};

/// A listener that is notified once a future is completed
///
/// Exactly one of the callbacks is invoked, exactly once; the listener is consumed by it.
pub trait Listener<T, E>: Send {
    /// Called if the computation produced a value
    fn on_result(self: Box<Self>, value: &T);
    /// Called if the computation failed
    fn on_error(self: Box<Self>, error: &E);
    /// Called if the future has been cancelled
    fn on_cancelled(self: Box<Self>);
}

/// A listener assembled from three closures
pub struct Callbacks<R, F, C> {
    /// The success callback
    on_result: R,
    /// The failure callback
    on_error: F,
    /// The cancellation callback
    on_cancelled: C,
}
impl<R, F, C> Callbacks<R, F, C> {
    /// Creates a new listener from the given callbacks
    pub const fn new(on_result: R, on_error: F, on_cancelled: C) -> Self {
        Self { on_result, on_error, on_cancelled }
    }
}
impl<T, E, R, F, C> Listener<T, E> for Callbacks<R, F, C>
where
    R: FnOnce(&T) + Send,
    F: FnOnce(&E) + Send,
    C: FnOnce() + Send,
{
    fn on_result(self: Box<Self>, value: &T) {
        (self.on_result)(value)
    }
    fn on_error(self: Box<Self>, error: &E) {
        (self.on_error)(error)
    }
    fn on_cancelled(self: Box<Self>) {
        (self.on_cancelled)()
    }
}
impl<R, F, C> Debug for Callbacks<R, F, C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks").finish_non_exhaustive()
    }
}

/// A listener that receives the terminal outcome through a single closure
pub struct OnOutcome<F> {
    /// The callback
    callback: F,
}
impl<F> OnOutcome<F> {
    /// Creates a new listener from `callback`
    pub const fn new(callback: F) -> Self {
        Self { callback }
    }
}
impl<T, E, F> Listener<T, E> for OnOutcome<F>
where
    F: FnOnce(Outcome<&T, &E>) + Send,
{
    fn on_result(self: Box<Self>, value: &T) {
        (self.callback)(Outcome::Succeeded(value))
    }
    fn on_error(self: Box<Self>, error: &E) {
        (self.callback)(Outcome::Failed(error))
    }
    fn on_cancelled(self: Box<Self>) {
        (self.callback)(Outcome::Cancelled)
    }
}
impl<F> Debug for OnOutcome<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnOutcome").finish_non_exhaustive()
    }
}

/// A queued listener that can be claimed exactly once
pub(crate) struct Registration<T, E> {
    /// The listener until somebody claims it
    listener: Mutex<Option<Box<dyn Listener<T, E>>>>,
}
impl<T, E> Registration<T, E> {
    /// Creates a new registration for `listener`
    pub fn new(listener: Box<dyn Listener<T, E>>) -> Self {
        Self { listener: Mutex::new(Some(listener)) }
    }

    /// Takes the listener out of the registration; only the first caller gets it
    pub fn claim(&self) -> Option<Box<dyn Listener<T, E>>> {
        // Nothing can panic while the lock is held, so a poisoned lock still holds a consistent value
        self.listener.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering::SeqCst},
        Arc,
    };

    #[test]
    fn registration_is_claimed_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let listener = Callbacks::new(
            move |value: &usize| {
                counter.fetch_add(*value, SeqCst);
            },
            |_: &()| panic!("Unexpected error callback"),
            || panic!("Unexpected cancellation callback"),
        );

        let registration: Registration<usize, ()> = Registration::new(Box::new(listener));
        let claimed = registration.claim().expect("Registration has not been claimable");
        assert!(registration.claim().is_none(), "Registration has been claimed twice");

        claimed.on_result(&7);
        assert_eq!(fired.load(SeqCst), 7, "Listener has not been fired");
    }

    #[test]
    fn on_outcome_maps_callbacks() {
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let listener: Box<dyn Listener<u8, &str>> =
            Box::new(OnOutcome::new(move |outcome: Outcome<&u8, &&str>| sink.lock().unwrap().push(format!("{outcome:?}"))));
        listener.on_error(&"boom");

        let sink = Arc::clone(&seen);
        let listener: Box<dyn Listener<u8, &str>> =
            Box::new(OnOutcome::new(move |outcome: Outcome<&u8, &&str>| sink.lock().unwrap().push(format!("{outcome:?}"))));
        listener.on_cancelled();

        assert_eq!(*seen.lock().unwrap(), ["Failed(\"boom\")", "Cancelled"]);
    }
}
