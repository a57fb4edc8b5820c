//! # Fanout
//!
//! 并发扇出写入引擎。
//!
//! 负责：
//! - 每个 sink 一个独立 worker，串行写入
//! - 一次 `write` 分发到全部 sink，等待全部完成后返回
//! - 隔离慢 sink 与失败 sink，不影响其他 sink

pub mod actor;
pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod sinks;

#[cfg(test)]
mod test_support;

pub use actor::SinkActor;
pub use contracts::{ByteSink, Chunk, SinkError};
pub use coordinator::FanOutWriter;
pub use error::FanOutError;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{
    classify, BestEffortWriter, ProcessSink, StreamSink, WriteErrorClass, WRITE_ERROR_CLASSES,
};
pub use tokio_util::sync::CancellationToken;
