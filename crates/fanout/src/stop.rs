//! Cooperative stop signal

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::info;

use crate::error::TeeError;

/// Shared stop flag, observed by the tee loop between lines
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<StopInner>,
}

#[derive(Debug, Default)]
struct StopInner {
    stopped: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop and wake anyone waiting in [`StopSignal::triggered`]
    pub fn trigger(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Resolve once a stop has been requested
    pub async fn triggered(&self) {
        loop {
            // Register before checking the flag so a concurrent trigger is not missed.
            let notified = self.inner.notify.notified();
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }
}

/// Something that arranges for a [`StopSignal`] to be triggered later
pub trait StopListener {
    fn install(self, stop: StopSignal) -> Result<(), TeeError>;
}

impl<F> StopListener for F
where
    F: FnOnce(StopSignal) -> Result<(), TeeError>,
{
    fn install(self, stop: StopSignal) -> Result<(), TeeError> {
        self(stop)
    }
}

/// Triggers the stop signal on SIGINT or SIGTERM (Ctrl+C elsewhere)
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSignals;

impl StopListener for OsSignals {
    #[cfg(unix)]
    fn install(self, stop: StopSignal) -> Result<(), TeeError> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut interrupt =
            signal(SignalKind::interrupt()).map_err(|source| TeeError::Signal { source })?;
        let mut terminate =
            signal(SignalKind::terminate()).map_err(|source| TeeError::Signal { source })?;

        tokio::spawn(async move {
            tokio::select! {
                _ = interrupt.recv() => info!(signal = "SIGINT", "Stop requested"),
                _ = terminate.recv() => info!(signal = "SIGTERM", "Stop requested"),
            }
            stop.trigger();
        });
        Ok(())
    }

    #[cfg(not(unix))]
    fn install(self, stop: StopSignal) -> Result<(), TeeError> {
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!(signal = "ctrl-c", "Stop requested");
                    stop.trigger();
                }
                Err(e) => tracing::warn!(error = %e, "Ctrl+C listener failed"),
            }
        });
        Ok(())
    }
}
