//! Sink implementations
//!
//! Contains BestEffortWriter, StreamSink, and ProcessSink.

mod best_effort;
mod process;
mod stream;

pub use self::best_effort::{classify, BestEffortWriter, WriteErrorClass, WRITE_ERROR_CLASSES};
pub use self::process::ProcessSink;
pub use self::stream::StreamSink;
