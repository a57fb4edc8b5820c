//! Pipeline orchestrator - reads input in chunks and drives the fan-out writer.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use bytes::BytesMut;
use contracts::RexConfig;
use fanout::{CancellationToken, FanOutWriter};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use super::PipelineStats;
use crate::error::CliError;

/// How long a failed run waits for sinks to close before exiting anyway
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Main pipeline orchestrator
pub struct Pipeline {
    config: RexConfig,
    cancel: CancellationToken,
    export_metrics: bool,
}

impl Pipeline {
    /// Create a new pipeline; cancelling `cancel` interrupts the run
    pub fn new(config: RexConfig, cancel: CancellationToken) -> Self {
        Self {
            config,
            cancel,
            export_metrics: false,
        }
    }

    /// Push per-sink counters to the metrics recorder after every chunk
    pub fn with_metrics_export(mut self, enabled: bool) -> Self {
        self.export_metrics = enabled;
        self
    }

    /// Open every destination and copy `input` to all of them until EOF
    ///
    /// On success every sink is closed and every child has exited before
    /// returning. A failed run cancels the sinks and waits at most
    /// [`SHUTDOWN_GRACE`] for them.
    #[instrument(
        name = "pipeline_run",
        skip_all,
        fields(destinations = self.config.destinations.len(), buffer_size = self.config.buffer_size)
    )]
    pub async fn run<R>(self, input: R) -> Result<PipelineStats>
    where
        R: AsyncRead + Unpin,
    {
        let start_time = Instant::now();

        let sinks = dest::open_all(&self.config.destinations)
            .context("Failed to open destinations")?;
        let sink_cancel = self.cancel.child_token();
        let writer = FanOutWriter::new(sinks, sink_cancel.clone())?;

        info!(sinks = writer.sink_count(), "Pipeline running");

        let outcome = self
            .copy(input, &writer)
            .await
            .and_then(|stats| Self::check_sinks(&writer).map(|()| stats));
        let sink_metrics = writer.metrics();

        if outcome.is_ok() {
            debug!("Shutting down sinks...");
            writer.shutdown().await;
        } else {
            // A sibling may still be stuck in a write it accepted earlier;
            // stop everything and give up on it after the grace period.
            sink_cancel.cancel();
            if timeout(SHUTDOWN_GRACE, writer.shutdown()).await.is_err() {
                warn!(
                    grace_secs = SHUTDOWN_GRACE.as_secs_f64(),
                    "Sinks did not shut down in time, abandoning them"
                );
            }
        }

        let mut stats = outcome?;
        stats.sinks = sink_metrics;
        stats.duration = start_time.elapsed();

        info!(
            chunks = stats.chunks,
            bytes = stats.bytes,
            duration_secs = stats.duration.as_secs_f64(),
            "Pipeline finished"
        );
        Ok(stats)
    }

    /// Read-write loop
    ///
    /// Each chunk is frozen out of the read buffer and handed to the writer;
    /// once `write` returns no sink holds it any more, so the buffer can
    /// reclaim the storage for the next read.
    async fn copy<R>(&self, mut input: R, writer: &FanOutWriter) -> Result<PipelineStats, CliError>
    where
        R: AsyncRead + Unpin,
    {
        let buffer_size = self.config.buffer_size;
        let mut stats = PipelineStats::default();
        let mut buf = BytesMut::with_capacity(buffer_size);

        loop {
            buf.resize(buffer_size, 0);

            let n = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(CliError::Interrupted),
                read = input.read(&mut buf[..]) => read.map_err(CliError::input)?,
            };

            if n == 0 {
                debug!(chunks = stats.chunks, "End of input");
                return Ok(stats);
            }

            buf.truncate(n);
            let chunk = buf.split().freeze();

            let started = Instant::now();
            let written = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(CliError::Interrupted),
                written = writer.write(chunk) => written,
            };
            if let Err(err) = written {
                if self.cancel.is_cancelled() {
                    return Err(CliError::Interrupted);
                }
                return Err(err.into());
            }
            let latency = started.elapsed();

            stats.record_chunk(n, latency);
            observability::record_chunk(n);
            observability::record_write_latency(latency);

            if self.export_metrics {
                for (name, snapshot) in writer.metrics() {
                    observability::record_sink_snapshot(&name, &snapshot);
                }
            }
        }
    }

    /// Fail the run if any sink stopped, even without a rejected write
    fn check_sinks(writer: &FanOutWriter) -> Result<(), CliError> {
        match writer.errors().into_iter().next() {
            None => Ok(()),
            Some(err) if err.is_cancelled() => Err(CliError::Interrupted),
            Some(err) => Err(err.into()),
        }
    }
}
