//! Sink - buffered, lock-guarded write target

use std::path::Path;

use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use contracts::CONSOLE_SINK_NAME;

use crate::error::TeeError;
use crate::metrics::SinkMetrics;

/// Owned resource behind a sink
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// One output destination of a tee session
///
/// Writes and the final flush go through the same mutex, so they never
/// interleave. The resource is dropped (closed) when the sink is closed.
pub struct Sink {
    name: String,
    /// `None` once closed
    writer: Mutex<Option<BufWriter<BoxedWriter>>>,
    metrics: SinkMetrics,
}

impl Sink {
    /// Wrap `resource` with a buffer of `capacity` bytes (at least 1)
    pub fn new<W>(name: impl Into<String>, resource: W, capacity: usize) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let resource: BoxedWriter = Box::new(resource);
        Self {
            name: name.into(),
            writer: Mutex::new(Some(BufWriter::with_capacity(capacity.max(1), resource))),
            metrics: SinkMetrics::new(),
        }
    }

    /// Sink over the process's standard output
    pub fn console(capacity: usize) -> Self {
        Self::new(CONSOLE_SINK_NAME, tokio::io::stdout(), capacity)
    }

    /// Open `path` as a file sink
    ///
    /// Truncates (creating if needed) unless `append` is set, in which case
    /// writes go past the existing end (still creating a missing file).
    #[instrument(name = "sink_open_file", skip(path), fields(path = %path.display()))]
    pub async fn open_file(path: &Path, append: bool, capacity: usize) -> Result<Self, TeeError> {
        let mut options = OpenOptions::new();
        if append {
            // A missing file is created rather than rejected.
            options.append(true).create(true);
        } else {
            options.write(true).create(true).truncate(true);
        }

        let file = options
            .open(path)
            .await
            .map_err(|e| TeeError::open(path, e))?;

        debug!(path = %path.display(), append, capacity, "Destination opened");
        Ok(Self::new(path.display().to_string(), file, capacity))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    /// Write all of `bytes` into the buffer
    ///
    /// Returns the number of bytes accepted. A full buffer is flushed to the
    /// resource on the way.
    pub async fn write(&self, bytes: &[u8]) -> Result<usize, TeeError> {
        let mut guard = self.writer.lock().await;
        let writer = guard
            .as_mut()
            .ok_or_else(|| TeeError::sink_closed(&self.name))?;

        match writer.write_all(bytes).await {
            Ok(()) => {
                self.metrics.record_write(bytes.len());
                Ok(bytes.len())
            }
            Err(e) => {
                self.metrics.inc_failure_count();
                Err(TeeError::write(&self.name, e))
            }
        }
    }

    /// Flush buffered bytes, then close the resource
    ///
    /// The resource is shut down even if the flush fails; the flush error is
    /// reported first. Closing an already closed sink does nothing.
    #[instrument(name = "sink_close", skip(self), fields(sink = %self.name))]
    pub async fn close(&self) -> Result<(), TeeError> {
        let mut guard = self.writer.lock().await;
        let Some(mut writer) = guard.take() else {
            debug!(sink = %self.name, "Sink already closed");
            return Ok(());
        };

        let flushed = writer.flush().await;
        // Bypass the buffer: a failed flush must not be retried by shutdown.
        let shut = writer.get_mut().shutdown().await;
        drop(writer);

        match (flushed, shut) {
            (Err(flush_err), shut) => {
                if let Err(close_err) = shut {
                    warn!(sink = %self.name, error = %close_err, "Close failed after flush failure");
                }
                Err(TeeError::flush(&self.name, flush_err))
            }
            (Ok(()), Err(close_err)) => Err(TeeError::close(&self.name, close_err)),
            (Ok(()), Ok(())) => {
                debug!(sink = %self.name, "Sink closed");
                Ok(())
            }
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.writer.lock().await.is_none()
    }
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink")
            .field("name", &self.name)
            .field("metrics", &self.metrics.snapshot())
            .finish_non_exhaustive()
    }
}
