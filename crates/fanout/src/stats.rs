//! Run statistics

use std::fmt;
use std::time::Duration;

use observability::StatsSummary;

use crate::metrics::MetricsSnapshot;

/// Statistics from a tee run
#[derive(Debug, Clone, Default)]
pub struct TeeStats {
    /// Lines delivered to every sink
    pub lines: u64,

    /// Bytes per sink, separators included
    pub bytes: u64,

    /// Sinks in the session, console included
    pub sinks: usize,

    /// Wall time from initialization to teardown
    pub duration: Duration,

    /// Whether a stop signal ended the run
    pub stopped: bool,

    /// Fan-out round latency, barrier included
    pub round_latency_ms: StatsSummary,

    /// Per-sink counters in session order
    pub per_sink: Vec<(String, MetricsSnapshot)>,
}

impl TeeStats {
    /// Lines per second throughput
    pub fn lines_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.lines as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl fmt::Display for TeeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== mtee summary ===")?;
        writeln!(f, "Duration: {:.3}s", self.duration.as_secs_f64())?;
        writeln!(f, "Lines: {} ({:.2}/s)", self.lines, self.lines_per_sec())?;
        writeln!(f, "Bytes per sink: {}", self.bytes)?;
        writeln!(f, "Round latency (ms): {}", self.round_latency_ms)?;
        if self.stopped {
            writeln!(f, "Stopped by signal")?;
        }
        writeln!(f, "Sinks ({}):", self.sinks)?;
        for (name, snapshot) in &self.per_sink {
            writeln!(
                f,
                "  {}: {} lines, {} bytes, {} failures",
                name, snapshot.write_count, snapshot.bytes_written, snapshot.failure_count
            )?;
        }
        Ok(())
    }
}
