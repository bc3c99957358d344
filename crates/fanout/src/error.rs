//! Fan-out engine error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while opening, feeding or tearing down a tee session
#[derive(Debug, Error)]
pub enum TeeError {
    /// A destination could not be created or opened
    #[error("failed to open '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input stream failed
    #[error("failed to read input: {source}")]
    Read {
        #[source]
        source: std::io::Error,
    },

    /// A sink rejected a write
    #[error("write to '{sink}' failed: {source}")]
    Write {
        sink: String,
        #[source]
        source: std::io::Error,
    },

    /// Buffered bytes could not be flushed at close
    #[error("flush of '{sink}' failed: {source}")]
    Flush {
        sink: String,
        #[source]
        source: std::io::Error,
    },

    /// The underlying resource failed to close
    #[error("close of '{sink}' failed: {source}")]
    Close {
        sink: String,
        #[source]
        source: std::io::Error,
    },

    /// Write attempted after close
    #[error("sink '{sink}' is closed")]
    SinkClosed { sink: String },

    /// A spawned open/write/close task died
    #[error("task failed: {message}")]
    Task { message: String },

    /// One or more sinks failed to close
    #[error("failed to close {count} sink(s): {summary}", count = .errors.len(), summary = join_errors(.errors))]
    Teardown { errors: Vec<TeeError> },

    /// Stop-signal listener could not be installed
    #[error("failed to install signal handler: {source}")]
    Signal {
        #[source]
        source: std::io::Error,
    },
}

impl TeeError {
    pub fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    pub fn read(source: std::io::Error) -> Self {
        Self::Read { source }
    }

    pub fn write(sink: impl Into<String>, source: std::io::Error) -> Self {
        Self::Write {
            sink: sink.into(),
            source,
        }
    }

    pub fn flush(sink: impl Into<String>, source: std::io::Error) -> Self {
        Self::Flush {
            sink: sink.into(),
            source,
        }
    }

    pub fn close(sink: impl Into<String>, source: std::io::Error) -> Self {
        Self::Close {
            sink: sink.into(),
            source,
        }
    }

    pub fn sink_closed(sink: impl Into<String>) -> Self {
        Self::SinkClosed { sink: sink.into() }
    }

    pub fn task(message: impl ToString) -> Self {
        Self::Task {
            message: message.to_string(),
        }
    }

    /// Name of the sink this error belongs to, if any
    pub fn sink(&self) -> Option<&str> {
        match self {
            Self::Write { sink, .. }
            | Self::Flush { sink, .. }
            | Self::Close { sink, .. }
            | Self::SinkClosed { sink } => Some(sink),
            _ => None,
        }
    }
}

fn join_errors(errors: &[TeeError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_open_error_mentions_path() {
        let err = TeeError::open("/no/such/dir/out.log", io::Error::from(io::ErrorKind::NotFound));
        assert!(err.to_string().contains("/no/such/dir/out.log"));
    }

    #[test]
    fn test_teardown_lists_every_failure() {
        let err = TeeError::Teardown {
            errors: vec![
                TeeError::flush("a.log", io::Error::other("disk full")),
                TeeError::close("b.log", io::Error::other("bad fd")),
            ],
        };
        let message = err.to_string();
        assert!(message.starts_with("failed to close 2 sink(s)"), "got: {message}");
        assert!(message.contains("a.log") && message.contains("b.log"), "got: {message}");
    }

    #[test]
    fn test_sink_accessor() {
        assert_eq!(
            TeeError::write("out", io::Error::other("x")).sink(),
            Some("out")
        );
        assert_eq!(TeeError::task("boom").sink(), None);
    }
}
