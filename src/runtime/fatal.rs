//! Last-resort handling for faults that escape every per-request path. A
//! worker in an unknown state must not keep accepting requests: its resolver
//! cache and other process-wide state can no longer be trusted, so the
//! coordinator is expected to observe the death and redispatch.

use anyhow::Error as AnyError;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct FatalErrorHandler {
    inner: Arc<FatalInner>,
}

struct FatalInner {
    triggered: AtomicBool,
    root_shutdown: CancellationToken,
    run_shutdown: CancellationToken,
    captured_error: Mutex<Option<CapturedFatalError>>,
    notify: Notify,
}

#[derive(Clone)]
struct CapturedFatalError {
    inner: Arc<AnyError>,
}

impl CapturedFatalError {
    fn new(inner: AnyError) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl fmt::Debug for CapturedFatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CapturedFatalError")
            .field(&self.inner)
            .finish()
    }
}

impl fmt::Display for CapturedFatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.inner.as_ref(), f)
    }
}

impl std::error::Error for CapturedFatalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref().as_ref())
    }
}

impl FatalErrorHandler {
    pub fn new(root_shutdown: CancellationToken, run_shutdown: CancellationToken) -> Self {
        Self {
            inner: Arc::new(FatalInner {
                triggered: AtomicBool::new(false),
                root_shutdown,
                run_shutdown,
                captured_error: Mutex::new(None),
                notify: Notify::new(),
            }),
        }
    }

    /// Records the first fatal fault, cancels both shutdown tokens, and
    /// returns the error for propagation. Later triggers return their error
    /// unchanged; only the first is captured.
    pub fn trigger(&self, context: &str, error: AnyError) -> AnyError {
        if self.inner.triggered.swap(true, Ordering::SeqCst) {
            return error;
        }

        tracing::error!(
            context,
            error = %error,
            "fatal worker fault; initiating shutdown"
        );

        self.capture_error(CapturedFatalError::new(error))
    }

    fn capture_error(&self, error: CapturedFatalError) -> AnyError {
        {
            let mut slot = self.inner.captured_error.lock().unwrap();
            if slot.is_none() {
                *slot = Some(error.clone());
            }
        }

        self.inner.run_shutdown.cancel();
        self.inner.root_shutdown.cancel();
        self.inner.notify.notify_waiters();

        error.into()
    }

    pub fn error(&self) -> Option<AnyError> {
        self.inner
            .captured_error
            .lock()
            .unwrap()
            .as_ref()
            .map(|error| error.clone().into())
    }
}

/// Process-termination seam so the supervisor's exit path stays observable in
/// tests.
pub trait Terminator: Send + Sync + 'static {
    fn terminate(&self, status: i32);
}

/// Production terminator: ends the process immediately.
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn terminate(&self, status: i32) {
        std::process::exit(status);
    }
}

/// Top-level supervisor wrapping the worker's entire run loop.
///
/// Any failure that escapes all in-process handling is written to the
/// process's error stream and the process terminates with a non-zero status —
/// it is never surfaced as a structured reply, since the process may no
/// longer be able to communicate reliably.
pub struct Supervisor {
    terminator: Arc<dyn Terminator>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::with_terminator(Arc::new(ProcessTerminator))
    }

    pub fn with_terminator(terminator: Arc<dyn Terminator>) -> Self {
        Self { terminator }
    }

    /// Drives `run` to completion; an escaped error ends the process.
    pub async fn run<F>(&self, run: F)
    where
        F: std::future::Future<Output = anyhow::Result<()>>,
    {
        if let Err(error) = run.await {
            self.fail(&error);
        }
    }

    /// Logs the fault's full chain to stderr and terminates with status 1.
    pub fn fail(&self, error: &AnyError) {
        tracing::error!(error = %error, "unrecoverable worker fault; terminating");
        eprintln!("{error:?}");
        self.terminator.terminate(1);
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}
