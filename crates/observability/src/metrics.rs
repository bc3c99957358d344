//! Fan-out 指标收集模块
//!
//! 基于 `metrics` facade 记录分发指标，并提供在线统计工具。

use metrics::{counter, gauge, histogram};

/// 记录从输入读取的一行
pub fn record_line_read(bytes: usize) {
    counter!("mtee_lines_total").increment(1);
    counter!("mtee_input_bytes_total").increment(bytes as u64);
}

/// 记录一次 sink 写入结果
pub fn record_sink_write(sink_name: &str, success: bool, bytes: usize) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "mtee_sink_writes_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        counter!("mtee_sink_bytes_total", "sink" => sink_name.to_string())
            .increment(bytes as u64);
    }
}

/// 记录一轮 fan-out 的耗时（含屏障等待）
pub fn record_round_latency_ms(latency_ms: f64) {
    histogram!("mtee_round_latency_ms").record(latency_ms);
}

/// 记录当前会话中的 sink 数量
pub fn record_sinks_opened(count: usize) {
    gauge!("mtee_sinks").set(count as f64);
}

/// 记录关闭阶段的 sink 关闭结果
pub fn record_sink_close(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "mtee_sink_closes_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
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

/// 在线统计 (Welford 算法)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加样本
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

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

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
