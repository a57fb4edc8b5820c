//! ProcessSink - feeds a child process through its stdin

use std::io::{self, Write};
use std::process::{Child, ChildStdin, Command, Stdio};

use contracts::ByteSink;
use tracing::{debug, info, instrument, warn};

/// Sink that writes into the stdin of a spawned child process
///
/// The child inherits stdout and stderr. Closing the sink closes the pipe and
/// waits for the child to exit.
#[derive(Debug)]
pub struct ProcessSink {
    name: String,
    child: Child,
    stdin: Option<ChildStdin>,
}

impl ProcessSink {
    /// Spawn `program` with `args` and a piped stdin
    #[instrument(name = "process_sink_spawn", skip(args))]
    pub fn spawn(name: &str, program: &str, args: &[String]) -> io::Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("child stdin was not captured"))?;

        info!(pid = child.id(), "Child process started");

        Ok(Self {
            name: name.to_string(),
            child,
            stdin: Some(stdin),
        })
    }

    /// Process id of the child
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    fn stdin(&mut self) -> io::Result<&mut ChildStdin> {
        self.stdin
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::BrokenPipe))
    }
}

impl ByteSink for ProcessSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, chunk: &[u8]) -> io::Result<usize> {
        self.stdin()?.write_all(chunk)?;
        Ok(chunk.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stdin.as_mut() {
            Some(stdin) => stdin.flush(),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        // Dropping stdin delivers EOF to the child.
        drop(self.stdin.take());

        let status = self.child.wait()?;
        if status.success() {
            debug!(sink = %self.name, pid = self.id(), "Child process exited");
        } else {
            warn!(sink = %self.name, pid = self.id(), %status, "Child process exited with failure");
        }
        Ok(())
    }
}
