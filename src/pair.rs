use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::{future::Future, pin::Pin, task::{Context, Poll, Waker}};
use futures::executor::block_on;
use tracing::trace;
use crate::{poly, Completion, Error, Promise};

/// This `pair::Producer` promise can only have one consumer. The consumer
/// returns a `Result<T, Error>`.
///
/// # Examples
///
/// ```
/// use promise_lines::{Promise, pair::Producer};
/// use std::thread;
/// let (promise, consumer) = Producer::<String>::new();
///
/// let task1 = thread::spawn(move || consumer.wait());
/// promise.resolve("Hi".into());
/// assert_eq!(task1.join().unwrap().unwrap(), "Hi");
/// ```
#[derive(Debug)]
pub struct Producer<T> {
    promise: Arc<Mutex<Inner<T>>>,
}

#[derive(Debug)]
pub struct Consumer<T> {
    promise: Arc<Mutex<Inner<T>>>,
}

type Callback<T> = Box<dyn FnOnce(Result<T, Error>) + Send>;

#[derive(Debug)]
enum WakerState {
    Fresh,
    Tainted,
}

struct Inner<T> {
    value: Option<Result<T, Error>>,
    // Tainted once the producer has settled.
    waker: Result<Waker, WakerState>,
    callback: Option<Callback<T>>,
}

impl<T> fmt::Debug for Inner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inner")
            .field("ready", &self.value.is_some())
            .field("waker", &self.waker)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl<T> Inner<T> {
    fn is_settled(&self) -> bool {
        matches!(self.waker, Err(WakerState::Tainted))
    }
}

fn lock<T>(promise: &Mutex<Inner<T>>) -> MutexGuard<'_, Inner<T>> {
    promise.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> Producer<T> {
    /// Hands `value` to the registered callback, or stores it and wakes the
    /// consumer. The callback runs with the lock released.
    fn settle(&self, value: Result<T, Error>) {
        let mut promise = lock(&self.promise);
        if let Ok(waker) = std::mem::replace(&mut promise.waker, Err(WakerState::Tainted)) {
            waker.wake()
        }
        match promise.callback.take() {
            Some(callback) => {
                drop(promise);
                trace!("running continuation on the settling thread");
                callback(value)
            }
            None => promise.value = Some(value),
        }
    }
}

impl<T> Promise for Producer<T> {
    type Output = T;
    type Error = Error;
    type Waiter = Consumer<T>;

    /// Settles the promise with `value` and wakes the consumer.
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_lines::pair::Producer;
    /// use promise_lines::Promise;
    /// use std::thread;
    /// let (op, op_a) = Producer::<String>::new();
    /// let task1 = thread::spawn(move || op_a.wait().unwrap());
    /// let task2 = thread::spawn(move || op.resolve(String::from("🍓")));
    /// assert_eq!(task1.join().expect("The task1 thread has panicked"), "🍓");
    /// task2.join().expect("The task2 thread has panicked");
    /// ```
    fn resolve(self, value: T) {
        self.settle(Ok(value));
    }

    /// Settles the promise with `err`.
    fn reject(self, err: Error) {
        self.settle(Err(err));
    }

    fn new() -> (Self, Consumer<T>) {
        let inner = Arc::new(Mutex::new(Inner {
            value: None,
            waker: Err(WakerState::Fresh),
            callback: None,
        }));
        (Self { promise: inner.clone() }, Consumer { promise: inner })
    }
}

impl<T> Drop for Producer<T> {
    /// If this is an unresolved producer, reject with `ProducerDropped`.
    fn drop(&mut self) {
        if !lock(&self.promise).is_settled() {
            trace!("producer dropped unsettled");
            self.settle(Err(Error::ProducerDropped));
        }
    }
}

impl<T> Future for Consumer<T> {
    type Output = Result<T, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut promise = lock(&self.promise);
        match promise.value.take() {
            Some(value) => Poll::Ready(value),
            None => match std::mem::replace(&mut promise.waker, Ok(cx.waker().clone())) {
                Err(WakerState::Tainted) => {
                    promise.waker = Err(WakerState::Tainted);
                    Poll::Ready(Err(Error::ProducerDropped))
                }
                _ => Poll::Pending,
            },
        }
    }
}

impl<T> Consumer<T> {
    /// Blocks the current thread until the producer settles.
    pub fn wait(self) -> Result<T, Error> {
        block_on(self)
    }

    /// Registers `callback` to receive the settled value.
    ///
    /// If the value is already there the callback runs right away on this
    /// thread, otherwise it runs on whichever thread settles the producer.
    pub fn on_settled<F>(self, callback: F)
    where
        F: FnOnce(Result<T, Error>) + Send + 'static,
    {
        let mut promise = lock(&self.promise);
        match promise.value.take() {
            Some(value) => {
                drop(promise);
                callback(value)
            }
            None => promise.callback = Some(Box::new(callback)),
        }
    }

    /// Like [`on_settled`](Self::on_settled), but never runs `callback` on
    /// the calling thread. A value that is already there is handed to a
    /// fresh thread instead.
    fn on_settled_detached<F>(self, callback: F)
    where
        T: Send + 'static,
        F: FnOnce(Result<T, Error>) + Send + 'static,
    {
        let mut promise = lock(&self.promise);
        match promise.value.take() {
            Some(value) => {
                drop(promise);
                trace!("value already settled, running continuation on its own thread");
                thread::spawn(move || callback(value));
            }
            None => promise.callback = Some(Box::new(callback)),
        }
    }

    /// Chains `continuation` onto this promise and returns immediately.
    ///
    /// The continuation runs on the thread that settles the producer, so no
    /// waiter thread is parked on the promise. Only when the value is already
    /// there does it get a thread of its own.
    ///
    /// The returned [`Completion`] resolves once the continuation has run,
    /// or carries the producer's error (the continuation is then skipped).
    pub fn then<F>(self, continuation: F) -> Completion
    where
        T: Send + 'static,
        F: FnOnce(T) + Send + 'static,
    {
        let (producer, completion) = poly::Producer::new();
        self.on_settled_detached(move |value| producer.complete_with(value, continuation));
        completion
    }

    /// Maps the eventual value through `f`, producing a new promise. Like
    /// [`then`](Self::then), this never runs `f` on the calling thread.
    pub fn map<U, F>(self, f: F) -> Consumer<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let (producer, consumer) = Producer::new();
        self.on_settled_detached(move |value| match value {
            Ok(value) => match panic::catch_unwind(AssertUnwindSafe(move || f(value))) {
                Ok(mapped) => producer.resolve(mapped),
                Err(payload) => producer.reject(Error::panicked(payload)),
            },
            Err(err) => producer.reject(err),
        });
        consumer
    }
}
