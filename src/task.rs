//! Launching work on its own thread, and chaining onto it by spawning a
//! waiter.
//!
//! [`then`] is the straightforward but wasteful combinator: every call parks
//! one more thread on the input promise. [`Consumer::then`] does the same
//! job by registering the continuation with the producer instead.
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use tracing::{debug, trace};
use crate::pair::{Consumer, Producer};
use crate::{poly, Completion, Error, Promise};

/// Runs `task` on a new thread and returns the promise of its result.
///
/// An `Err` from the task, or a panic, rejects the promise.
///
/// ```
/// let answer = promise_lines::task::spawn(|| Ok(6 * 7));
/// assert_eq!(answer.wait().unwrap(), 42);
/// ```
pub fn spawn<T, F>(task: F) -> Consumer<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, Error> + Send + 'static,
{
    let (producer, consumer) = Producer::new();
    thread::spawn(move || {
        trace!("task started");
        match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(Ok(value)) => producer.resolve(value),
            Ok(Err(err)) => {
                debug!(%err, "task failed");
                producer.reject(err)
            }
            Err(payload) => producer.reject(Error::panicked(payload)),
        }
    });
    consumer
}

/// Chains `continuation` onto `first` by spawning a waiter thread that
/// blocks on `first` and then calls `continuation` with its value.
///
/// `first` is moved into the waiter. If it fails, the continuation is
/// skipped and the returned [`Completion`] carries the error.
pub fn then<T, F>(first: Consumer<T>, continuation: F) -> Completion
where
    T: Send + 'static,
    F: FnOnce(T) + Send + 'static,
{
    let (producer, completion) = poly::Producer::new();
    thread::spawn(move || {
        trace!("waiter started");
        producer.complete_with(first.wait(), continuation);
    });
    completion
}
