//! Fan-out error types

use contracts::SinkError;
use thiserror::Error;

/// Fan-out specific errors
#[derive(Debug, Error)]
pub enum FanOutError {
    /// Coordinator built without sinks
    #[error("at least one output required")]
    NoSinks,

    /// A sink refused or failed a chunk
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl FanOutError {
    /// OS error code behind this error, if any
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Sink(err) => err.raw_os_error(),
            Self::NoSinks => None,
        }
    }
}
