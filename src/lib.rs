#![doc = include_str!("../README.md")]

mod cell;
mod error;
mod future;
mod listener;
mod outcome;
mod settable;

pub use crate::{
    cell::{spawn, CompletionCell, Task},
    error::{Error, GetError},
    future::{Interrupt, SyncFuture},
    listener::{Callbacks, Listener, OnOutcome},
    outcome::Outcome,
    settable::SettableFuture,
};
