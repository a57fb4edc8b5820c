//! FanOutWriter - dispatches each chunk to every sink and waits for all of them

use contracts::{ByteSink, Chunk, SinkError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::actor::SinkActor;
use crate::error::FanOutError;
use crate::metrics::MetricsSnapshot;

/// Duplicates a byte stream to a fixed, ordered set of sinks
///
/// A call to [`FanOutWriter::write`] returns only once every sink has
/// written (or discarded) the chunk, so the caller may reuse the storage
/// behind it afterwards.
pub struct FanOutWriter {
    actors: Vec<SinkActor>,
}

impl FanOutWriter {
    /// Spawn one actor per sink, in the given order
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// [`FanOutError::NoSinks`] if `sinks` is empty.
    #[instrument(name = "fanout_new", skip(sinks, cancel), fields(sink_count = sinks.len()))]
    pub fn new(
        sinks: Vec<Box<dyn ByteSink>>,
        cancel: CancellationToken,
    ) -> Result<Self, FanOutError> {
        if sinks.is_empty() {
            return Err(FanOutError::NoSinks);
        }

        let actors = sinks
            .into_iter()
            .map(|sink| SinkActor::spawn(sink, cancel.child_token()))
            .collect();

        Self::with_actors(actors)
    }

    /// Create a writer over already spawned actors (for testing)
    pub fn with_actors(actors: Vec<SinkActor>) -> Result<Self, FanOutError> {
        if actors.is_empty() {
            return Err(FanOutError::NoSinks);
        }
        info!(sinks = actors.len(), "Fan-out writer started");
        Ok(Self { actors })
    }

    /// Number of sinks
    pub fn sink_count(&self) -> usize {
        self.actors.len()
    }

    /// Write `chunk` to every sink
    ///
    /// Every actor is handed the chunk before any of them is waited on, so a
    /// slow sink never delays delivery to a fast one.
    ///
    /// # Errors
    /// - The stored error of the first already-terminal actor, in sink order.
    ///   Nothing is waited for in that case; actors that accepted the chunk
    ///   keep writing it on their own.
    /// - Otherwise, after the barrier, the error of the first actor that
    ///   failed while writing this chunk.
    #[instrument(name = "fanout_write", level = "trace", skip_all, fields(len = chunk.len()))]
    pub async fn write(&self, chunk: Chunk) -> Result<usize, SinkError> {
        for actor in &self.actors {
            actor.submit(chunk.clone()).await?;
        }

        self.wait().await;

        if let Some(err) = self.first_error() {
            warn!(sink = %err.sink_name(), error = %err, "Sink failed while writing chunk");
            return Err(err);
        }

        Ok(chunk.len())
    }

    /// Block until all scheduled writes have completed
    async fn wait(&self) {
        for actor in &self.actors {
            actor.await_drain().await;
        }
    }

    fn first_error(&self) -> Option<SinkError> {
        self.actors.iter().find_map(SinkActor::current_error)
    }

    /// Terminal errors of all stopped sinks, in sink order
    pub fn errors(&self) -> Vec<SinkError> {
        self.actors
            .iter()
            .filter_map(SinkActor::current_error)
            .collect()
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.actors
            .iter()
            .map(|a| (a.name().to_string(), a.metrics().snapshot()))
            .collect()
    }

    /// Close every sink after its accepted chunks are written
    #[instrument(name = "fanout_shutdown", skip(self), fields(sinks = self.actors.len()))]
    pub async fn shutdown(self) {
        for actor in self.actors {
            actor.shutdown().await;
        }
        debug!("Fan-out writer shutdown complete");
    }
}
