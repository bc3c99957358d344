//! In-memory resources for exercising sinks and sessions

use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{ready, Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use tokio::io::AsyncWrite;
use tokio::time::Sleep;

use contracts::LineSource;

#[derive(Debug, Default)]
struct State {
    data: Vec<u8>,
    writes: usize,
    flushes: usize,
    shutdowns: usize,
}

/// `AsyncWrite` backed by a shared byte buffer, with injectable failures
///
/// Clones share the recorded state, so a test keeps one clone to inspect
/// while the other is handed to a sink.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    state: Arc<Mutex<State>>,
    fail_writes_after: Option<usize>,
    fail_flush: bool,
    fail_shutdown: bool,
    delay: Option<Duration>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl Clone for MemoryWriter {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            fail_writes_after: self.fail_writes_after,
            fail_flush: self.fail_flush,
            fail_shutdown: self.fail_shutdown,
            delay: self.delay,
            sleep: None,
        }
    }
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `writes` write calls, then fail every following one
    pub fn fail_writes_after(mut self, writes: usize) -> Self {
        self.fail_writes_after = Some(writes);
        self
    }

    pub fn fail_flush(mut self) -> Self {
        self.fail_flush = true;
        self
    }

    pub fn fail_shutdown(mut self) -> Self {
        self.fail_shutdown = true;
        self
    }

    /// Hold every write call for `delay` before accepting it
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn contents(&self) -> Vec<u8> {
        self.state().data.clone()
    }

    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.state().data).into_owned()
    }

    /// Successful write calls seen by the resource
    pub fn writes(&self) -> usize {
        self.state().writes
    }

    pub fn flushes(&self) -> usize {
        self.state().flushes
    }

    pub fn shutdowns(&self) -> usize {
        self.state().shutdowns
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let this = self.get_mut();

        if let Some(delay) = this.delay {
            let sleep = this
                .sleep
                .get_or_insert_with(|| Box::pin(tokio::time::sleep(delay)));
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;
        }

        let mut state = this.state();
        if this.fail_writes_after.is_some_and(|limit| state.writes >= limit) {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "injected write failure",
            )));
        }
        state.data.extend_from_slice(buf);
        state.writes += 1;
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.fail_flush {
            return Poll::Ready(Err(io::Error::other("injected flush failure")));
        }
        this.state().flushes += 1;
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        this.state().shutdowns += 1;
        if this.fail_shutdown {
            return Poll::Ready(Err(io::Error::other("injected close failure")));
        }
        Poll::Ready(Ok(()))
    }
}

type ReadHook = Box<dyn FnMut(usize) + Send>;

/// Line source replaying a fixed script
///
/// Counts every `next_line` call (including the final end-of-input call)
/// and can run a hook or fail at a chosen call.
pub struct ScriptedSource {
    lines: VecDeque<Bytes>,
    reads: Arc<AtomicUsize>,
    hook: Option<ReadHook>,
    fail_at: Option<usize>,
}

impl ScriptedSource {
    pub fn new<I, T>(lines: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            reads: Arc::new(AtomicUsize::new(0)),
            hook: None,
            fail_at: None,
        }
    }

    /// Run `hook(call_index)` at the start of every `next_line` call
    pub fn on_read(mut self, hook: impl FnMut(usize) + Send + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Fail the `index`-th call (0-based) with a read error
    pub fn fail_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Shared count of `next_line` calls
    pub fn read_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.reads)
    }
}

impl LineSource for ScriptedSource {
    async fn next_line(&mut self) -> io::Result<Option<Bytes>> {
        let index = self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = self.hook.as_mut() {
            hook(index);
        }
        if self.fail_at == Some(index) {
            return Err(io::Error::other("injected read failure"));
        }
        Ok(self.lines.pop_front())
    }
}

/// Line source that never produces a line
#[derive(Debug, Default)]
pub struct PendingSource;

impl LineSource for PendingSource {
    async fn next_line(&mut self) -> io::Result<Option<Bytes>> {
        std::future::pending().await
    }
}
