//! # Fanout
//!
//! 逐行分发模块。
//!
//! 负责：
//! - 从 [`LineSource`] 逐行读取输入
//! - 将每一行并发写入所有目标文件与控制台
//! - 所有 sink 完成当前行后才读取下一行
//! - 首个写入失败即中止，每个 sink 恰好关闭一次

pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod outcome;
pub mod session;
pub mod sink;
pub mod source;
pub mod stats;
pub mod stop;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use contracts::LineSource;
pub use error::TeeError;
pub use lifecycle::{run, run_with};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use outcome::WriteOutcome;
pub use session::{Session, SessionConfig};
pub use sink::{BoxedWriter, Sink};
pub use source::{ReaderLineSource, StdinLineSource};
pub use stats::TeeStats;
pub use stop::{OsSignals, StopListener, StopSignal};
