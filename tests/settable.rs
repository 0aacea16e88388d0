use listenable_future::{Error, GetError, OnOutcome, Outcome, SettableFuture, Task};
use std::{
    sync::{mpsc, Arc},
    thread,
    time::Duration,
};

#[test]
fn run_is_unsupported() {
    let future = SettableFuture::<u8, String>::new();
    let task: &dyn Task = &future;

    // Running must fail and leave the future untouched
    assert_eq!(task.run(), Err(Error::Unsupported), "Settable future has been run");
    assert!(!future.is_done(), "Settable future has been completed by run");

    future.set_result(7).expect("Future has already been set");
    assert_eq!(future.get(), Ok(7), "Future has invalid result");
}

#[test]
fn second_set_is_rejected() {
    let future = SettableFuture::<u8, String>::new();
    let (sender, receiver) = mpsc::channel();
    future.add_listener(OnOutcome::new(move |outcome: Outcome<&u8, &String>| {
        sender.send(format!("{outcome:?}")).expect("Failed to report outcome");
    }));

    // Set the result, then try to overwrite it
    future.set_result(7).expect("Future has already been set");
    assert_eq!(future.set_error("boom".to_string()), Err(Error::AlreadyCompleted), "Future has been set twice");
    assert_eq!(future.set_result(77), Err(Error::AlreadyCompleted), "Future has been set twice");

    // The listener has been fired once with the first outcome
    assert_eq!(receiver.try_iter().collect::<Vec<_>>(), ["Succeeded(7)"], "Listener has been fired incorrectly");
    assert_eq!(future.outcome(), Outcome::Succeeded(&7), "Outcome has been changed");
}

#[test]
fn producer_sets_error() {
    let future = Arc::new(SettableFuture::<u8, String>::new());

    // Set an error after one second
    let producer = Arc::clone(&future);
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(1));
        producer.set_error("task is interrupted".to_string()).expect("Future has already been set");
    });

    // Wait until the error is set
    let result = future.get_timeout(Duration::from_secs(5));
    assert_eq!(result, Err(GetError::Failed("task is interrupted".to_string())), "Future has invalid error");
}

#[test]
fn consumers_and_producer() {
    let future = Arc::new(SettableFuture::<u8, String>::new());
    let (sender, receiver) = mpsc::channel();

    // Consumers block or listen concurrently
    let getters: Vec<_> = (0..4)
        .map(|_| {
            let future = Arc::clone(&future);
            thread::spawn(move || future.get())
        })
        .collect();
    let listeners: Vec<_> = (0..4)
        .map(|_| {
            let (future, sender) = (Arc::clone(&future), sender.clone());
            thread::spawn(move || {
                future.add_listener(OnOutcome::new(move |outcome: Outcome<&u8, &String>| {
                    sender.send(outcome == Outcome::Succeeded(&7)).expect("Failed to report outcome");
                }))
            })
        })
        .collect();
    drop(sender);

    // Produce the value
    thread::sleep(Duration::from_millis(100));
    future.set_result(7).expect("Future has already been set");

    for getter in getters {
        assert_eq!(getter.join().expect("Getter has panicked"), Ok(7), "Getter got invalid result");
    }
    for listener in listeners {
        listener.join().expect("Registrant has panicked");
    }
    let notified: Vec<_> = receiver.iter().collect();
    assert_eq!(notified, [true; 4], "Listeners have not been fired exactly once");
}

#[test]
fn cancellation() {
    let future = SettableFuture::<u8, String>::default();
    assert!(future.cancel(true), "Future has not been cancellable");
    assert!(future.is_cancelled(), "Future has not been marked as cancelled");
    assert_eq!(future.set_result(7), Err(Error::AlreadyCompleted), "Cancelled future has been set");
    assert_eq!(future.get(), Err(GetError::Cancelled), "Future has not been cancelled");
}
