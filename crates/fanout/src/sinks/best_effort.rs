//! BestEffortWriter - lossy writer for descriptors that may report would-block
//!
//! When the destination reaches capacity before a write completes, the
//! unwritten remainder is discarded and the write is reported as a success.

use std::io::{self, Write};

use contracts::ByteSink;
use tracing::{debug, trace};

/// How a low-level write error is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteErrorClass {
    /// Resource temporarily full: absorbed, reported as full success
    Transient,
    /// Call interrupted before any byte moved: retry the same suffix
    Retry,
    /// Anything else: propagated to the caller
    Hard,
}

/// Error kinds that are not hard failures. Kinds absent here are `Hard`.
///
/// `WouldBlock` covers both EAGAIN and EWOULDBLOCK.
pub const WRITE_ERROR_CLASSES: &[(io::ErrorKind, WriteErrorClass)] = &[
    (io::ErrorKind::WouldBlock, WriteErrorClass::Transient),
    (io::ErrorKind::Interrupted, WriteErrorClass::Retry),
];

/// Classify a low-level write error
pub fn classify(err: &io::Error) -> WriteErrorClass {
    WRITE_ERROR_CLASSES
        .iter()
        .find(|(kind, _)| *kind == err.kind())
        .map(|(_, class)| *class)
        .unwrap_or(WriteErrorClass::Hard)
}

/// Writer that treats a saturated destination as a successful write
pub struct BestEffortWriter<W> {
    name: String,
    inner: W,
    dropped_bytes: u64,
}

impl<W: Write> BestEffortWriter<W> {
    /// Wrap an already-open low-level resource
    pub fn new(name: impl Into<String>, inner: W) -> Self {
        Self {
            name: name.into(),
            inner,
            dropped_bytes: 0,
        }
    }

    /// Total bytes discarded because the destination was full
    pub fn dropped_bytes(&self) -> u64 {
        self.dropped_bytes
    }

    /// Get a reference to the wrapped resource
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the underlying resource
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Write `buf`, absorbing would-block as success
    ///
    /// Returns `buf.len()` when the data was delivered or the remainder was
    /// dropped after the destination filled up. When the resource accepts
    /// zero bytes without an error the loop stops and the short count written
    /// so far is returned; the remainder is silently truncated.
    ///
    /// # Errors
    /// Any error classified as [`WriteErrorClass::Hard`].
    pub fn write_best_effort(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut written = 0;

        while written < buf.len() {
            match self.inner.write(&buf[written..]) {
                Ok(0) => {
                    debug!(
                        sink = %self.name,
                        written,
                        len = buf.len(),
                        "Destination accepted zero bytes, truncating"
                    );
                    return Ok(written);
                }
                Ok(n) => written += n,
                Err(e) => match classify(&e) {
                    WriteErrorClass::Transient => {
                        let dropped = buf.len() - written;
                        self.dropped_bytes += dropped as u64;
                        trace!(sink = %self.name, written, dropped, "Destination full, dropping remainder");
                        return Ok(buf.len());
                    }
                    WriteErrorClass::Retry => continue,
                    WriteErrorClass::Hard => return Err(e),
                },
            }
        }

        Ok(written)
    }
}

impl<W: Write> Write for BestEffortWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_best_effort(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.flush() {
            Err(e) if classify(&e) == WriteErrorClass::Transient => Ok(()),
            other => other,
        }
    }
}

impl<W: Write + Send> ByteSink for BestEffortWriter<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, chunk: &[u8]) -> io::Result<usize> {
        self.write_best_effort(chunk)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(self)
    }

    fn close(&mut self) -> io::Result<()> {
        if self.dropped_bytes > 0 {
            debug!(sink = %self.name, dropped_bytes = self.dropped_bytes, "Best-effort sink closed with data loss");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Resource with a fixed capacity that reports would-block once full
    struct CappedResource {
        data: Vec<u8>,
        capacity: usize,
        calls: usize,
    }

    impl CappedResource {
        fn new(capacity: usize) -> Self {
            Self {
                data: Vec::new(),
                capacity,
                calls: 0,
            }
        }
    }

    impl Write for CappedResource {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls += 1;
            let room = self.capacity - self.data.len();
            if room == 0 {
                return Err(io::Error::from(io::ErrorKind::WouldBlock));
            }
            let n = room.min(buf.len());
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Resource replaying scripted results; `Ok(n)` consumes `n` bytes
    struct ScriptedResource {
        script: VecDeque<io::Result<usize>>,
        data: Vec<u8>,
    }

    impl ScriptedResource {
        fn new(script: Vec<io::Result<usize>>) -> Self {
            Self {
                script: script.into(),
                data: Vec::new(),
            }
        }
    }

    impl Write for ScriptedResource {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            match self.script.pop_front() {
                Some(Ok(n)) => {
                    let n = n.min(buf.len());
                    self.data.extend_from_slice(&buf[..n]);
                    Ok(n)
                }
                Some(Err(e)) => Err(e),
                None => panic!("write called after script ended"),
            }
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_classification_table() {
        assert_eq!(
            classify(&io::Error::from(io::ErrorKind::WouldBlock)),
            WriteErrorClass::Transient
        );
        assert_eq!(
            classify(&io::Error::from(io::ErrorKind::Interrupted)),
            WriteErrorClass::Retry
        );
        assert_eq!(
            classify(&io::Error::from(io::ErrorKind::BrokenPipe)),
            WriteErrorClass::Hard
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_eagain_is_transient() {
        // EAGAIN == EWOULDBLOCK == 11
        assert_eq!(
            classify(&io::Error::from_raw_os_error(11)),
            WriteErrorClass::Transient
        );
    }

    #[test]
    fn test_full_write_passes_through() {
        let mut writer = BestEffortWriter::new("cap", CappedResource::new(64));
        assert_eq!(writer.write_best_effort(b"hello world").unwrap(), 11);
        assert_eq!(writer.get_ref().data, b"hello world");
        assert_eq!(writer.dropped_bytes(), 0);
    }

    #[test]
    fn test_would_block_reports_full_length() {
        let mut writer = BestEffortWriter::new("cap", CappedResource::new(8));
        let buf: Vec<u8> = (0..20).collect();

        assert_eq!(writer.write_best_effort(&buf).unwrap(), 20);
        assert_eq!(writer.get_ref().data, &buf[..8]);
        assert_eq!(writer.dropped_bytes(), 12);
    }

    #[test]
    fn test_dropped_remainder_is_never_retried() {
        let mut writer = BestEffortWriter::new("cap", CappedResource::new(8));
        writer.write_best_effort(&[1u8; 20]).unwrap();
        // One write that filled the resource, one that hit would-block.
        assert_eq!(writer.get_ref().calls, 2);
    }

    #[test]
    fn test_partial_writes_are_retried() {
        let resource = ScriptedResource::new(vec![Ok(3), Ok(2), Ok(10)]);
        let mut writer = BestEffortWriter::new("partial", resource);

        assert_eq!(writer.write_best_effort(b"abcdefghij").unwrap(), 10);
        assert_eq!(writer.into_inner().data, b"abcdefghij");
    }

    #[test]
    fn test_zero_write_stops_with_short_count() {
        let resource = ScriptedResource::new(vec![Ok(4), Ok(0)]);
        let mut writer = BestEffortWriter::new("zero", resource);

        assert_eq!(writer.write_best_effort(b"abcdefgh").unwrap(), 4);
        let resource = writer.into_inner();
        assert_eq!(resource.data, b"abcd");
        assert!(resource.script.is_empty());
    }

    #[test]
    fn test_interrupted_is_retried() {
        let resource = ScriptedResource::new(vec![
            Err(io::Error::from(io::ErrorKind::Interrupted)),
            Ok(5),
        ]);
        let mut writer = BestEffortWriter::new("eintr", resource);

        assert_eq!(writer.write_best_effort(b"abcde").unwrap(), 5);
    }

    #[test]
    fn test_hard_error_propagates() {
        let resource = ScriptedResource::new(vec![
            Ok(2),
            Err(io::Error::from(io::ErrorKind::BrokenPipe)),
        ]);
        let mut writer = BestEffortWriter::new("broken", resource);

        let err = writer.write_best_effort(b"abcdef").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(writer.get_ref().data, b"ab");
    }

    #[test]
    fn test_byte_sink_name() {
        let writer = BestEffortWriter::new("type=fd,id=1", CappedResource::new(1));
        assert_eq!(ByteSink::name(&writer), "type=fd,id=1");
    }
}
