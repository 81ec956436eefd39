use std::{any::Any, io, path::PathBuf, sync::Arc};

/// Errors surfaced by promises and the line counter.
///
/// I/O sources are shared so the same failure can be handed to every waiter
/// of a [`Completion`](crate::Completion).
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("error opening {}", .path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("error reading {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("producer dropped without settling the promise")]
    ProducerDropped,
    #[error("task panicked: {0}")]
    Panicked(String),
}

impl Error {
    pub(crate) fn file_open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::FileOpen {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Read {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Builds an error from a panic payload caught with `catch_unwind`.
    pub(crate) fn panicked(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => (*message).to_owned(),
                Err(_) => "unknown panic payload".to_owned(),
            },
        };
        Error::Panicked(message)
    }
}
