use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::{future::Future, pin::Pin, task::{Context, Poll, Waker}};
use futures::executor::block_on;
use tracing::warn;
use crate::{Error, Promise};

/// This `poly::Producer` promise can have many consumers. The consumers may be
/// cloned. The consumers return a `Arc<Result<T, Error>>`, and awaiting a
/// consumer again after it settled returns the same value immediately.
///
/// # Examples
///
/// ```
/// use promise_lines::{Promise, poly::Producer};
/// use std::thread;
/// let (promise, consumer) = Producer::<String>::new();
/// let consumer2 = consumer.clone();
/// let task1 = thread::spawn(move || consumer.wait());
/// let task2 = thread::spawn(move || consumer2.wait());
/// promise.resolve("Hi".into());
/// assert_eq!(task1.join().expect("The task1 thread has panicked.").unwrap(), "Hi");
/// assert_eq!(task2.join().expect("The task2 thread has panicked.").unwrap(), "Hi");
/// ```
#[derive(Debug)]
pub struct Producer<T> {
    promise: Arc<Mutex<Inner<T>>>,
}

#[derive(Debug)]
pub struct Consumer<T> {
    promise: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for Consumer<T> {
    fn clone(&self) -> Self {
        Self { promise: self.promise.clone() }
    }
}

#[derive(Debug)]
struct Inner<T> {
    value: Option<Arc<Result<T, Error>>>,
    // Every pending consumer keeps its own waker.
    waker: Vec<Waker>,
}

fn lock<T>(promise: &Mutex<Inner<T>>) -> MutexGuard<'_, Inner<T>> {
    promise.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> Producer<T> {
    fn settle(&self, value: Result<T, Error>) {
        let mut promise = lock(&self.promise);
        if promise.value.is_some() {
            return;
        }
        promise.value = Some(Arc::new(value));
        for waker in promise.waker.drain(..) {
            waker.wake()
        }
    }
}

impl Producer<()> {
    /// Runs `continuation` on `value` and settles with its outcome. A failed
    /// `value` skips the continuation and is forwarded as is.
    pub(crate) fn complete_with<T, F>(self, value: Result<T, Error>, continuation: F)
    where
        F: FnOnce(T),
    {
        match value {
            Ok(value) => match panic::catch_unwind(AssertUnwindSafe(move || continuation(value))) {
                Ok(()) => self.resolve(()),
                Err(payload) => {
                    let err = Error::panicked(payload);
                    warn!(%err, "continuation panicked");
                    self.reject(err)
                }
            },
            Err(err) => {
                warn!(%err, "skipping continuation, producer failed");
                self.reject(err)
            }
        }
    }
}

impl<T> Promise for Producer<T> {
    type Output = T;
    type Error = Error;
    type Waiter = Consumer<T>;

    /// Settles every consumer with `value`.
    fn resolve(self, value: T) {
        self.settle(Ok(value));
    }

    /// Settles every consumer with `err`.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_lines::{Error, Promise, poly::Producer};
    /// use std::thread;
    /// let (op, op_a) = Producer::<()>::new();
    /// let task1 = thread::spawn(move || op_a.wait());
    /// let task2 = thread::spawn(move || op.reject(Error::Panicked("💥".into())));
    /// task2.join().expect("The task2 thread has panicked");
    /// assert!(task1.join().expect("The task1 thread has panicked").is_err());
    /// ```
    fn reject(self, err: Error) {
        self.settle(Err(err));
    }

    /// promise.new
    ///
    /// This is a slight fib because we're not returning two `Self`s. We're
    /// returning a `Consumer<T>` which you can wait on.
    fn new() -> (Self, Self::Waiter) {
        let producer = Self {
            promise: Arc::new(Mutex::new(Inner {
                value: None,
                waker: vec![],
            })),
        };
        let consumer = Consumer { promise: producer.promise.clone() };
        (producer, consumer)
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        self.settle(Err(Error::ProducerDropped));
    }
}

impl<T> Future for Consumer<T> {
    type Output = Arc<Result<T, Error>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut promise = lock(&self.promise);
        match promise.value {
            Some(ref value) => Poll::Ready(value.clone()),
            None => {
                promise.waker.push(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl<T: Clone> Consumer<T> {
    /// Blocks until the producer settles. Later calls return the same
    /// outcome without blocking.
    pub fn wait(&self) -> Result<T, Error> {
        (*block_on(self.clone())).clone()
    }
}

impl<T> Consumer<T> {
    /// Whether the producer has settled.
    pub fn is_settled(&self) -> bool {
        lock(&self.promise).value.is_some()
    }
}

#[cfg(test)]
mod tests {
use futures::executor::block_on;
use std::thread;
use super::Producer;
use crate::{Error, Promise};

#[test]
fn test_promise_out_resolve() {
    let (op, op_a) = Producer::<String>::new();
    let task1 = thread::spawn(move || block_on(op_a));
    let task2 = thread::spawn(move || op.resolve(String::from("🍓")));
    task2.join().expect("The task2 thread has panicked");
    let value = task1.join().expect("The task1 thread has panicked");
    assert!(matches!(&*value, Ok(v) if v == "🍓"));
}

#[test]
fn test_two_promises_out_resolve() {
    let (op, op_a) = Producer::<String>::new();
    let op_b = op_a.clone();
    let task1 = thread::spawn(move || op_a.wait());
    let task2 = thread::spawn(move || op_b.wait());
    let task3 = thread::spawn(move || op.resolve(String::from("🍓")));
    task3.join().expect("The task3 thread has panicked");
    assert_eq!(task1.join().expect("The task1 thread has panicked").unwrap(), "🍓");
    assert_eq!(task2.join().expect("The task2 thread has panicked").unwrap(), "🍓");
}

#[test]
fn test_promise_out_reject() {
    let (a, b) = Producer::<String>::new();
    let task1 = thread::spawn(move || b.wait());
    let task2 = thread::spawn(|| a.reject(Error::Panicked("reject!!".into())));
    task2.join().expect("The task2 thread has panicked");
    let value = task1.join().expect("The task1 thread has panicked");
    assert!(matches!(value, Err(Error::Panicked(ref m)) if m == "reject!!"));
}

#[test]
fn test_wait_twice_returns_same_outcome() {
    let (a, b) = Producer::<u8>::new();
    assert!(!b.is_settled());
    a.resolve(3);
    assert!(b.is_settled());
    assert_eq!(b.wait().unwrap(), 3);
    assert_eq!(b.wait().unwrap(), 3);
}

#[test]
fn test_dropped_producer_rejects() {
    let (a, b) = Producer::<u8>::new();
    drop(a);
    assert!(matches!(b.wait(), Err(Error::ProducerDropped)));
}

#[test]
fn test_complete_with_skips_continuation_on_error() {
    let (a, b) = Producer::<()>::new();
    let mut ran = false;
    a.complete_with(Err::<u8, _>(Error::ProducerDropped), |_| ran = true);
    assert!(!ran);
    assert!(matches!(b.wait(), Err(Error::ProducerDropped)));
}
}
