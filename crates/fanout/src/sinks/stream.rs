//! StreamSink - plain blocking writer

use std::io::{self, Write};

use contracts::ByteSink;

/// Sink over any blocking `Write`
///
/// Every chunk is written in full or the write fails.
pub struct StreamSink<W> {
    name: String,
    inner: W,
}

impl<W: Write> StreamSink<W> {
    /// Create a new StreamSink
    pub fn new(name: impl Into<String>, inner: W) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }

    /// Get a reference to the wrapped writer
    pub fn get_ref(&self) -> &W {
        &self.inner
    }
}

impl<W: Write + Send> ByteSink for StreamSink<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, chunk: &[u8]) -> io::Result<usize> {
        self.inner.write_all(chunk)?;
        Ok(chunk.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
