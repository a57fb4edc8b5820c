//! ByteSink trait - fan-out output interface
//!
//! Defines the abstract interface every destination implements.

use std::io;

/// Synchronous byte destination
///
/// Implementations may block inside [`ByteSink::write`]; the fan-out engine
/// always calls them from a dedicated blocking context.
pub trait ByteSink: Send {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one chunk
    ///
    /// Returns the number of bytes the sink reports as consumed. A short count
    /// without an error is a sink-specific policy (see `BestEffortWriter`) and
    /// is never retried by the caller.
    ///
    /// # Errors
    /// Any error is terminal for the sink.
    fn write(&mut self, chunk: &[u8]) -> io::Result<usize>;

    /// Flush buffered data (if any)
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Release the underlying resource
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: ByteSink + ?Sized> ByteSink for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn write(&mut self, chunk: &[u8]) -> io::Result<usize> {
        (**self).write(chunk)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}
