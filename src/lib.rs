//! One-shot promises with continuations, and the line counter used to feed
//! them.
//!
//! A [`pair::Producer`] settles exactly once; its [`pair::Consumer`] can be
//! waited on, awaited, or chained with [`pair::Consumer::then`]. Chaining
//! yields a [`Completion`] that any number of parties may wait on.
//!
//! ```
//! use promise_lines::{lines, Error};
//! use std::io::Write;
//!
//! let mut file = tempfile::NamedTempFile::new()?;
//! write!(file, "one\ntwo\nthree\n").unwrap();
//!
//! let done = lines::count_lines_async(file.path()).then(|count| assert_eq!(count, 3));
//! done.wait()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
mod error;
pub mod lines;
pub mod pair;
pub mod poly;
pub mod task;

pub use error::Error;

/// Completion of a continuation. Waiting on it is idempotent.
pub type Completion = poly::Consumer<()>;

/// The producing half of a promise.
///
/// A producer is consumed by settling it, so a promise can only be resolved
/// or rejected once.
pub trait Promise {
    type Output;
    type Error;
    type Waiter;

    /// Creates a producer and the waiter observing it.
    fn new() -> (Self, Self::Waiter)
    where
        Self: Sized;

    fn resolve(self, value: Self::Output);

    fn reject(self, err: Self::Error);
}
