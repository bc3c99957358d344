//! TeeSettings - Config Loader output
//!
//! Tuning knobs for a tee session that can come from a settings file.

use serde::{Deserialize, Serialize};

/// Buffer capacity for file sinks
pub const DEFAULT_FILE_BUFFER_SIZE: usize = 4096;

/// Buffer capacity for the console sink (effectively unbuffered)
pub const DEFAULT_CONSOLE_BUFFER_SIZE: usize = 1;

/// Name reported for the console sink in logs and errors
pub const CONSOLE_SINK_NAME: &str = "<stdout>";

/// Settings for a tee session
///
/// Every field is optional in the file; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TeeSettings {
    /// Append to destinations instead of truncating them
    pub append: bool,

    /// Buffer capacity (bytes) for each file sink
    pub file_buffer_size: usize,

    /// Buffer capacity (bytes) for the console sink
    pub console_buffer_size: usize,

    /// Prometheus exporter port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Default log filter when `RUST_LOG` is unset (e.g. "info")
    pub log_level: Option<String>,
}

impl Default for TeeSettings {
    fn default() -> Self {
        Self {
            append: false,
            file_buffer_size: DEFAULT_FILE_BUFFER_SIZE,
            console_buffer_size: DEFAULT_CONSOLE_BUFFER_SIZE,
            metrics_port: None,
            log_level: None,
        }
    }
}
