//! Pipeline statistics and metrics.

use std::time::Duration;

use fanout::MetricsSnapshot;
use observability::ThroughputAggregator;
use tracing::info;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Chunks read from input and written to every sink
    pub chunks: u64,

    /// Bytes read from input
    pub bytes: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Per-sink counters, in destination order
    pub sinks: Vec<(String, MetricsSnapshot)>,

    /// Chunk size and write latency aggregates
    pub throughput: ThroughputAggregator,
}

impl PipelineStats {
    /// Record one chunk that every sink accepted
    pub fn record_chunk(&mut self, bytes: usize, latency: Duration) {
        self.chunks += 1;
        self.bytes += bytes as u64;
        self.throughput.update(bytes, latency);
    }

    /// Input throughput in bytes per second
    pub fn bytes_per_sec(&self) -> f64 {
        self.throughput.bytes_per_sec(self.duration)
    }

    /// Log a detailed summary
    ///
    /// Goes through tracing rather than stdout, which may be a destination.
    pub fn log_summary(&self) {
        info!(
            chunks = self.chunks,
            bytes = self.bytes,
            duration_secs = format!("{:.3}", self.duration.as_secs_f64()),
            bytes_per_sec = format!("{:.0}", self.bytes_per_sec()),
            "Run summary"
        );
        info!(chunk_size = %self.throughput.chunk_size(), "Chunk size (bytes)");
        info!(latency = %self.throughput.latency_ms(), "Write latency (ms)");

        for (name, snapshot) in &self.sinks {
            info!(
                sink = %name,
                chunks = snapshot.chunk_count,
                bytes = snapshot.byte_count,
                failures = snapshot.failure_count,
                rejected = snapshot.rejected_count,
                "Sink summary"
            );
        }
    }
}
