//! Session - per-line fan-out with a barrier

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use contracts::{
    LineSource, TeeSettings, CONSOLE_SINK_NAME, DEFAULT_CONSOLE_BUFFER_SIZE,
    DEFAULT_FILE_BUFFER_SIZE,
};
use observability::{
    record_line_read, record_round_latency_ms, record_sink_close, record_sink_write,
    record_sinks_opened, RunningStats, StatsSummary,
};

use crate::error::TeeError;
use crate::outcome::WriteOutcome;
use crate::sink::Sink;
use crate::stats::TeeStats;
use crate::stop::StopSignal;

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Destination files, in argument order
    pub destinations: Vec<PathBuf>,
    /// Append instead of truncate
    pub append: bool,
    /// Buffer capacity for each file sink
    pub file_buffer_size: usize,
    /// Buffer capacity for the console sink
    pub console_buffer_size: usize,
}

impl SessionConfig {
    pub fn new(destinations: Vec<PathBuf>, append: bool) -> Self {
        Self {
            destinations,
            append,
            file_buffer_size: DEFAULT_FILE_BUFFER_SIZE,
            console_buffer_size: DEFAULT_CONSOLE_BUFFER_SIZE,
        }
    }

    pub fn from_settings(destinations: Vec<PathBuf>, settings: &TeeSettings) -> Self {
        Self {
            destinations,
            append: settings.append,
            file_buffer_size: settings.file_buffer_size,
            console_buffer_size: settings.console_buffer_size,
        }
    }
}

/// A running tee: one line source, a fixed set of sinks
pub struct Session<L> {
    /// Destinations in argument order, console last
    sinks: Vec<Arc<Sink>>,
    source: L,
    stop: StopSignal,
    lines: u64,
    bytes: u64,
    stopped: bool,
    round_latency: RunningStats,
}

impl<L: LineSource> Session<L> {
    /// Open every destination, then add the console sink
    ///
    /// Destinations are opened concurrently. If any open fails, the ones that
    /// succeeded are closed again and the first failure (in destination
    /// order) is returned; the console is left untouched.
    #[instrument(
        name = "session_initialize",
        skip_all,
        fields(destinations = config.destinations.len(), append = config.append)
    )]
    pub async fn initialize<W>(
        config: &SessionConfig,
        source: L,
        console: W,
        stop: StopSignal,
    ) -> Result<Self, TeeError>
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let append = config.append;
        let capacity = config.file_buffer_size;
        let mut sinks = open_all(&config.destinations, move |path| async move {
            Sink::open_file(&path, append, capacity).await
        })
        .await?;

        sinks.push(Arc::new(Sink::new(
            CONSOLE_SINK_NAME,
            console,
            config.console_buffer_size,
        )));

        info!(sinks = sinks.len(), append, "Session initialized");
        Ok(Self::from_arcs(sinks, source, stop))
    }

    /// Create a session over already constructed sinks
    pub fn with_sinks(sinks: Vec<Sink>, source: L, stop: StopSignal) -> Self {
        Self::from_arcs(sinks.into_iter().map(Arc::new).collect(), source, stop)
    }

    fn from_arcs(sinks: Vec<Arc<Sink>>, source: L, stop: StopSignal) -> Self {
        record_sinks_opened(sinks.len());
        Self {
            sinks,
            source,
            stop,
            lines: 0,
            bytes: 0,
            stopped: false,
            round_latency: RunningStats::default(),
        }
    }

    pub fn sinks(&self) -> &[Arc<Sink>] {
        &self.sinks
    }

    /// Lines delivered to every sink so far
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Replicate lines until the input ends, a write fails, or a stop is requested
    ///
    /// A line is read only after every sink has reported on the previous one.
    #[instrument(name = "session_run", skip(self), fields(sinks = self.sinks.len()))]
    pub async fn run(&mut self) -> Result<(), TeeError> {
        info!(sinks = self.sinks.len(), "Tee loop started");

        while let Some(line) = self.next_line().await? {
            self.fan_out(line).await?;

            if self.lines % 1000 == 0 {
                debug!(lines = self.lines, "Tee progress");
            }
        }

        info!(lines = self.lines, stopped = self.stopped, "Tee loop finished");
        Ok(())
    }

    async fn next_line(&mut self) -> Result<Option<Bytes>, TeeError> {
        if self.stop.is_triggered() {
            self.stopped = true;
            return Ok(None);
        }

        // Only the wait for input races the stop signal; writes never do.
        tokio::select! {
            biased;
            _ = self.stop.triggered() => {
                self.stopped = true;
                Ok(None)
            }
            read = self.source.next_line() => read.map_err(TeeError::read),
        }
    }

    async fn fan_out(&mut self, line: Bytes) -> Result<(), TeeError> {
        let started = Instant::now();
        record_line_read(line.len());
        let payload = terminate(&line);

        // One outcome per sink; sized so no write task ever waits to report.
        let (results_tx, mut results_rx) = mpsc::channel(self.sinks.len().max(1));
        let mut writes = JoinSet::new();
        for sink in &self.sinks {
            let sink = Arc::clone(sink);
            let payload = payload.clone();
            let results = results_tx.clone();
            writes.spawn(async move {
                let written = sink.write(&payload).await;
                record_sink_write(sink.name(), written.is_ok(), payload.len());
                // The receiver outlives every task of this round.
                let _ = results.send(WriteOutcome::from(written)).await;
            });
        }
        drop(results_tx);

        let mut failure = None;
        let mut record = |e: TeeError| {
            if failure.is_none() {
                failure = Some(e);
            } else {
                warn!(error = %e, "Additional sink failure on the same line");
            }
        };

        // Closes once every task has reported or died.
        while let Some(outcome) = results_rx.recv().await {
            if let WriteOutcome::Failure(e) = outcome {
                record(e);
            }
        }
        // A task that panicked never reported; surface it here.
        while let Some(joined) = writes.join_next().await {
            if let Err(e) = joined {
                record(TeeError::task(e));
            }
        }

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        record_round_latency_ms(elapsed_ms);
        self.round_latency.push(elapsed_ms);

        if let Some(e) = failure {
            error!(line = self.lines + 1, error = %e, "Write failed, aborting session");
            return Err(e);
        }

        self.lines += 1;
        self.bytes += payload.len() as u64;
        Ok(())
    }
}

impl<L> Session<L> {
    /// Flush and close every sink
    ///
    /// Sinks close concurrently; one failure never keeps another sink open.
    #[instrument(name = "session_close", skip(self), fields(sinks = self.sinks.len()))]
    pub async fn close(&self) -> Result<(), TeeError> {
        close_all(&self.sinks).await
    }

    /// Summarize the session so far
    pub fn stats(&self, duration: Duration) -> TeeStats {
        TeeStats {
            lines: self.lines,
            bytes: self.bytes,
            sinks: self.sinks.len(),
            duration,
            stopped: self.stopped,
            round_latency_ms: StatsSummary::from(&self.round_latency),
            per_sink: self
                .sinks
                .iter()
                .map(|s| (s.name().to_string(), s.metrics().snapshot()))
                .collect(),
        }
    }
}

/// `line` plus one `\n`
fn terminate(line: &[u8]) -> Bytes {
    let mut payload = BytesMut::with_capacity(line.len() + 1);
    payload.put_slice(line);
    payload.put_u8(b'\n');
    payload.freeze()
}

/// Open every destination on its own task and keep argument order
async fn open_all<F, Fut>(destinations: &[PathBuf], open: F) -> Result<Vec<Arc<Sink>>, TeeError>
where
    F: Fn(PathBuf) -> Fut,
    Fut: Future<Output = Result<Sink, TeeError>> + Send + 'static,
{
    let mut tasks = JoinSet::new();
    for (index, path) in destinations.iter().enumerate() {
        let opening = open(path.clone());
        tasks.spawn(async move { (index, opening.await) });
    }

    let mut slots: Vec<Option<Arc<Sink>>> = vec![None; destinations.len()];
    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(sink))) => slots[index] = Some(Arc::new(sink)),
            Ok((index, Err(e))) => failures.push((index, e)),
            Err(e) => failures.push((usize::MAX, TeeError::task(e))),
        }
    }

    let opened: Vec<Arc<Sink>> = slots.into_iter().flatten().collect();
    if failures.is_empty() {
        return Ok(opened);
    }

    failures.sort_by_key(|(index, _)| *index);
    let mut failures = failures.into_iter().map(|(_, e)| e);
    let first = failures.next().unwrap_or_else(|| TeeError::task("open failed"));
    for other in failures {
        warn!(error = %other, "Additional destination failed to open");
    }

    if let Err(e) = close_all(&opened).await {
        warn!(error = %e, "Closing partially opened destinations failed");
    }
    Err(first)
}

async fn close_all(sinks: &[Arc<Sink>]) -> Result<(), TeeError> {
    let mut tasks = JoinSet::new();
    for sink in sinks {
        let sink = Arc::clone(sink);
        tasks.spawn(async move {
            let closed = sink.close().await;
            record_sink_close(sink.name(), closed.is_ok());
            closed
        });
    }

    let mut errors = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(error = %e, "Sink close failed");
                errors.push(e);
            }
            Err(e) => {
                error!(error = %e, "Close task failed");
                errors.push(TeeError::task(e));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TeeError::Teardown { errors })
    }
}
