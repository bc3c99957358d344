//! CLI argument definitions using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// mtee - copy standard input to standard output and to every FILE, line by line
#[derive(Parser, Debug)]
#[command(
    name = "mtee",
    author,
    version,
    about = "Copy standard input to standard output and files, one line at a time",
    long_about = "Reads standard input line by line and writes every line to each FILE \n\
                  and to standard output concurrently. The next line is read only once \n\
                  every destination has accepted the current one. The first failed \n\
                  write stops the run; SIGINT/SIGTERM stop it between lines."
)]
pub struct Cli {
    /// Destination files (created if missing)
    #[arg(value_name = "FILE")]
    pub destinations: Vec<PathBuf>,

    /// Append to the destination files instead of truncating them
    #[arg(short, long, env = "MTEE_APPEND")]
    pub append: bool,

    /// Path to a settings file (TOML or JSON); defaults to ~/.mtee.toml when present
    #[arg(short, long, env = "MTEE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write buffer size for each destination file, in bytes
    #[arg(long, value_name = "BYTES", env = "MTEE_FILE_BUFFER_SIZE")]
    pub file_buffer_size: Option<usize>,

    /// Write buffer size for standard output, in bytes
    #[arg(long, value_name = "BYTES", env = "MTEE_CONSOLE_BUFFER_SIZE")]
    pub console_buffer_size: Option<usize>,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, env = "MTEE_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Print a run summary to stderr on exit
    #[arg(long, env = "MTEE_STATS")]
    pub stats: bool,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, env = "MTEE_VERBOSE")]
    pub verbose: u8,

    /// Log errors only
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", env = "MTEE_LOG_FORMAT")]
    pub log_format: LogFormat,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
