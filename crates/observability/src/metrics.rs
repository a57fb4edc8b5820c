//! 写入指标收集模块
//!
//! 全局 Prometheus 计数器，以及进程内的吞吐统计。

use std::time::Duration;

use fanout::MetricsSnapshot;
use metrics::{counter, histogram};

/// 记录一个已分发到全部 sink 的数据块
pub fn record_chunk(bytes: usize) {
    counter!("rex_chunks_total").increment(1);
    counter!("rex_bytes_total").increment(bytes as u64);
    histogram!("rex_chunk_size_bytes").record(bytes as f64);
}

/// 记录一次 `write` 的屏障等待耗时
pub fn record_write_latency(latency: Duration) {
    histogram!("rex_write_latency_seconds").record(latency.as_secs_f64());
}

/// 从 sink 快照同步计数器
///
/// 快照是累计值，所以使用 `absolute` 而不是 `increment`。
pub fn record_sink_snapshot(sink_name: &str, snapshot: &MetricsSnapshot) {
    for (status, value) in [
        ("success", snapshot.chunk_count),
        ("failure", snapshot.failure_count),
        ("rejected", snapshot.rejected_count),
    ] {
        counter!(
            "rex_sink_writes_total",
            "sink" => sink_name.to_string(),
            "status" => status
        )
        .absolute(value);
    }

    counter!("rex_sink_bytes_total", "sink" => sink_name.to_string())
        .absolute(snapshot.byte_count);
}

/// 吞吐统计聚合器
///
/// 在内存中聚合每个数据块的大小和写入耗时，运行结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct ThroughputAggregator {
    /// 总块数
    pub total_chunks: u64,

    /// 总字节数
    pub total_bytes: u64,

    /// 块大小统计 (字节)
    pub chunk_size_stats: RunningStats,

    /// 写入耗时统计 (毫秒)
    pub latency_stats: RunningStats,
}

impl ThroughputAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, bytes: usize, latency: Duration) {
        self.total_chunks += 1;
        self.total_bytes += bytes as u64;
        self.chunk_size_stats.push(bytes as f64);
        self.latency_stats.push(latency.as_secs_f64() * 1000.0);
    }

    /// 每秒字节数
    pub fn bytes_per_sec(&self, elapsed: Duration) -> f64 {
        if elapsed.as_secs_f64() > 0.0 {
            self.total_bytes as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// 块大小摘要
    pub fn chunk_size(&self) -> StatsSummary {
        StatsSummary::from(&self.chunk_size_stats)
    }

    /// 写入耗时摘要
    pub fn latency_ms(&self) -> StatsSummary {
        StatsSummary::from(&self.latency_stats)
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
