//! Entry point - build, run and tear down a tee session

use std::time::Instant;

use tokio::io::AsyncWrite;
use tracing::{info, instrument, warn};

use contracts::LineSource;

use crate::error::TeeError;
use crate::session::{Session, SessionConfig};
use crate::source::StdinLineSource;
use crate::stats::TeeStats;
use crate::stop::{OsSignals, StopListener, StopSignal};

/// Tee standard input to every destination and standard output
///
/// Stops on end of input, on the first failed write, or on SIGINT/SIGTERM.
pub async fn run(config: &SessionConfig) -> Result<TeeStats, TeeError> {
    run_with(config, StdinLineSource::stdin(), tokio::io::stdout(), OsSignals).await
}

/// [`run`] with injected input, console and stop listener
///
/// The listener is installed only once every destination is open. Every
/// opened sink is closed exactly once, whatever ends the loop. The loop's
/// error wins over teardown errors; a teardown error is returned only when
/// the loop itself succeeded.
#[instrument(
    name = "tee_run",
    skip_all,
    fields(destinations = config.destinations.len(), append = config.append)
)]
pub async fn run_with<L, W, S>(
    config: &SessionConfig,
    source: L,
    console: W,
    listener: S,
) -> Result<TeeStats, TeeError>
where
    L: LineSource,
    W: AsyncWrite + Send + Unpin + 'static,
    S: StopListener,
{
    let started = Instant::now();
    let stop = StopSignal::new();

    let mut session = Session::initialize(config, source, console, stop.clone()).await?;

    let outcome = match listener.install(stop) {
        Ok(()) => session.run().await,
        Err(e) => Err(e),
    };

    let closed = session.close().await;
    let stats = session.stats(started.elapsed());

    match (outcome, closed) {
        (Err(run_err), Err(close_err)) => {
            warn!(error = %close_err, "Teardown also failed");
            Err(run_err)
        }
        (Err(run_err), Ok(())) => Err(run_err),
        (Ok(()), Err(close_err)) => Err(close_err),
        (Ok(()), Ok(())) => {
            info!(
                lines = stats.lines,
                stopped = stats.stopped,
                duration_secs = stats.duration.as_secs_f64(),
                "Tee finished"
            );
            Ok(stats)
        }
    }
}
