//! In-memory sinks shared by the unit tests

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};

use contracts::ByteSink;

/// Sink recording everything it is asked to write
pub(crate) struct RecordingSink {
    name: String,
    data: Arc<Mutex<Vec<u8>>>,
    attempts: Arc<Mutex<Vec<Vec<u8>>>>,
    closed: Arc<AtomicBool>,
    fail_on: Option<usize>,
    gate: Option<mpsc::Receiver<()>>,
}

impl RecordingSink {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data: Arc::default(),
            attempts: Arc::default(),
            closed: Arc::default(),
            fail_on: None,
            gate: None,
        }
    }

    /// Fail the n-th write (1-based) with a broken pipe
    pub(crate) fn fail_on(mut self, n: usize) -> Self {
        self.fail_on = Some(n);
        self
    }

    /// Block every write until the returned sender sends or is dropped
    pub(crate) fn gated(mut self) -> (Self, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        self.gate = Some(rx);
        (self, tx)
    }

    /// Bytes successfully written
    pub(crate) fn data(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.data)
    }

    /// Every chunk passed to `write`, including failed ones
    pub(crate) fn attempts(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.attempts)
    }

    pub(crate) fn closed(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

impl ByteSink for RecordingSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, chunk: &[u8]) -> io::Result<usize> {
        if let Some(gate) = &self.gate {
            let _ = gate.recv();
        }

        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            attempts.push(chunk.to_vec());
            attempts.len()
        };

        if self.fail_on == Some(attempt) {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }

        self.data.lock().unwrap().extend_from_slice(chunk);
        Ok(chunk.len())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
