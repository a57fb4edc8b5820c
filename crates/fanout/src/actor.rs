//! SinkActor - manages a sink with an isolated queue and worker task
//!
//! Each actor owns one sink. Writes run on the worker, one at a time, in
//! submission order. The first failure (or cancellation) makes the actor
//! terminal: new chunks are refused, chunks accepted earlier are still
//! written, then the sink is closed and the worker exits.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{ByteSink, Chunk, SinkError};
use tokio::sync::{mpsc, Notify};
use tokio::task::{self, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::metrics::SinkMetrics;

/// Handoff queue depth. The coordinator never has more than one chunk in
/// flight per sink.
const QUEUE_CAPACITY: usize = 1;

/// Terminal error and pending count, guarded together
#[derive(Debug, Default)]
struct ActorState {
    error: Option<SinkError>,
    pending: usize,
}

/// State shared between the handle and the worker
#[derive(Debug, Default)]
struct ActorShared {
    state: Mutex<ActorState>,
    drained: Notify,
}

impl ActorShared {
    fn lock(&self) -> MutexGuard<'_, ActorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a pending write, or return the terminal error
    fn acquire(&self) -> Result<(), SinkError> {
        let mut state = self.lock();
        if let Some(err) = &state.error {
            return Err(err.clone());
        }
        state.pending += 1;
        Ok(())
    }

    /// Inverse of `acquire`, called once the write finished
    ///
    /// A failure is stored before the pending slot is given back, under the
    /// same lock, so a drained actor always shows the error of the write
    /// that drained it. Returns true if `failure` made the actor terminal.
    fn finish(&self, failure: Option<SinkError>) -> bool {
        let mut state = self.lock();
        let stopped = match failure {
            Some(err) if state.error.is_none() => {
                state.error = Some(err);
                true
            }
            _ => false,
        };
        state.pending = state.pending.saturating_sub(1);
        let drained = state.pending == 0;
        drop(state);

        if drained {
            self.drained.notify_waiters();
        }
        stopped
    }

    /// Move to the terminal state. Returns false if already terminal.
    fn stop(&self, err: SinkError) -> bool {
        let mut state = self.lock();
        if state.error.is_some() {
            return false;
        }
        state.error = Some(err);
        true
    }

    fn error(&self) -> Option<SinkError> {
        self.lock().error.clone()
    }

    fn pending(&self) -> usize {
        self.lock().pending
    }
}

/// Handle to a running sink worker
pub struct SinkActor {
    /// Sink name
    name: String,
    /// Channel to hand chunks to the worker
    tx: mpsc::Sender<Chunk>,
    /// Terminal error and pending count
    shared: Arc<ActorShared>,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl SinkActor {
    /// Create a new SinkActor and spawn its worker task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S: ByteSink + 'static>(sink: S, cancel: CancellationToken) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let shared = Arc::new(ActorShared::default());
        let metrics = Arc::new(SinkMetrics::new());

        let worker = SinkWorker {
            name: name.clone(),
            sink: Some(Box::new(sink)),
            rx,
            shared: Arc::clone(&shared),
            metrics: Arc::clone(&metrics),
            cancel,
        };
        let worker_handle = tokio::spawn(worker.run());

        Self {
            name,
            tx,
            shared,
            metrics,
            worker_handle,
        }
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Accept a chunk for asynchronous writing
    ///
    /// Success only means the chunk was accepted, not that it was written.
    ///
    /// # Errors
    /// The stored terminal error if the actor already stopped. The sink is
    /// not touched in that case.
    pub async fn submit(&self, chunk: Chunk) -> Result<(), SinkError> {
        if let Err(err) = self.shared.acquire() {
            self.metrics.inc_rejected_count();
            return Err(err);
        }

        if self.tx.send(chunk).await.is_err() {
            // The worker only exits once terminal with nothing pending, so
            // this means it died underneath us.
            self.shared.finish(Some(SinkError::WorkerGone {
                sink: self.name.clone(),
            }));
            error!(sink = %self.name, "Sink worker closed unexpectedly");
            return Err(self.current_error().unwrap_or_else(|| SinkError::WorkerGone {
                sink: self.name.clone(),
            }));
        }

        Ok(())
    }

    /// Terminal error, or `None` while the actor is active
    pub fn current_error(&self) -> Option<SinkError> {
        self.shared.error()
    }

    /// Number of accepted chunks not yet written
    pub fn pending(&self) -> usize {
        self.shared.pending()
    }

    /// Wait until every accepted chunk has been processed
    pub async fn await_drain(&self) {
        loop {
            let notified = self.shared.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.shared.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Shutdown the sink worker gracefully
    ///
    /// Closes the queue, lets the worker finish accepted chunks, and waits
    /// for the sink to be closed.
    #[instrument(name = "sink_actor_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(sink = %self.name, "SinkActor shutdown complete");
    }
}

/// Worker side of an actor
struct SinkWorker {
    name: String,
    /// `None` only after a write panicked and took the sink with it
    sink: Option<Box<dyn ByteSink>>,
    rx: mpsc::Receiver<Chunk>,
    shared: Arc<ActorShared>,
    metrics: Arc<SinkMetrics>,
    cancel: CancellationToken,
}

impl SinkWorker {
    #[instrument(name = "sink_worker_loop", skip(self), fields(sink = %self.name))]
    async fn run(mut self) {
        debug!(sink = %self.name, "Sink worker started");

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    if self.shared.stop(SinkError::cancelled(&self.name)) {
                        info!(sink = %self.name, "Sink cancelled");
                    }
                    break;
                }

                received = self.rx.recv() => {
                    let Some(chunk) = received else {
                        debug!(sink = %self.name, "Queue closed");
                        break;
                    };
                    if self.process(chunk).await.is_err() {
                        break;
                    }
                }
            }
        }

        self.drain().await;
        self.close().await;

        debug!(sink = %self.name, "Sink worker stopped");
    }

    /// Write every chunk accepted before the actor stopped
    async fn drain(&mut self) {
        while self.shared.pending() > 0 {
            let Some(chunk) = self.rx.recv().await else {
                break;
            };
            // Failures here are logged by `process` and counted, not stored.
            let _ = self.process(chunk).await;
        }
    }

    /// Write one chunk on the blocking pool and release its pending slot
    ///
    /// The first failure makes the actor terminal in the same step that
    /// releases the slot.
    async fn process(&mut self, chunk: Chunk) -> Result<(), SinkError> {
        match self.write_blocking(chunk).await {
            Ok(written) => {
                self.metrics.record_write(written);
                self.shared.finish(None);
                Ok(())
            }
            Err(e) => {
                self.metrics.inc_failure_count();
                let err = SinkError::write(&self.name, e);
                if self.shared.finish(Some(err.clone())) {
                    error!(sink = %self.name, error = %err, "Sink failed, rejecting further writes");
                } else {
                    debug!(sink = %self.name, error = %err, "Write failed after sink stopped");
                }
                Err(err)
            }
        }
    }

    async fn write_blocking(&mut self, chunk: Chunk) -> io::Result<usize> {
        let Some(mut sink) = self.sink.take() else {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        };

        match task::spawn_blocking(move || {
            let result = sink.write(&chunk);
            (sink, result)
        })
        .await
        {
            Ok((sink, result)) => {
                self.sink = Some(sink);
                result
            }
            Err(e) => Err(io::Error::other(format!("sink write panicked: {e}"))),
        }
    }

    /// Flush and release the underlying sink
    async fn close(&mut self) {
        let Some(mut sink) = self.sink.take() else {
            return;
        };
        let name = self.name.clone();

        let result = task::spawn_blocking(move || {
            if let Err(e) = sink.flush() {
                warn!(sink = %name, error = %e, "Flush failed on shutdown");
            }
            sink.close()
        })
        .await;

        match result {
            Ok(Ok(())) => debug!(sink = %self.name, "Sink closed"),
            Ok(Err(e)) => error!(sink = %self.name, error = %e, "Close failed on shutdown"),
            Err(e) => error!(sink = %self.name, error = %e, "Sink close panicked"),
        }
    }
}
