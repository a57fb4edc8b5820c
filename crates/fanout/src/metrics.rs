//! Sink metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a single sink actor
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Chunks the sink finished writing
    chunk_count: AtomicU64,
    /// Bytes the sink reported as consumed
    byte_count: AtomicU64,
    /// Failed writes (the first one makes the actor terminal)
    failure_count: AtomicU64,
    /// Submissions refused because the actor was terminal
    rejected_count: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get written chunk count
    pub fn chunk_count(&self) -> u64 {
        self.chunk_count.load(Ordering::Relaxed)
    }

    /// Get written byte count
    pub fn byte_count(&self) -> u64 {
        self.byte_count.load(Ordering::Relaxed)
    }

    /// Record a completed write
    pub fn record_write(&self, bytes: usize) {
        self.chunk_count.fetch_add(1, Ordering::Relaxed);
        self.byte_count.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Get failure count
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Increment failure count
    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get rejected count
    pub fn rejected_count(&self) -> u64 {
        self.rejected_count.load(Ordering::Relaxed)
    }

    /// Increment rejected count
    pub fn inc_rejected_count(&self) {
        self.rejected_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            chunk_count: self.chunk_count(),
            byte_count: self.byte_count(),
            failure_count: self.failure_count(),
            rejected_count: self.rejected_count(),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub chunk_count: u64,
    pub byte_count: u64,
    pub failure_count: u64,
    pub rejected_count: u64,
}
