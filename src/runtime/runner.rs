//! Worker request loop: services coordinator requests for the lifetime of
//! the process, under the top-level fatal guard.

use crate::exec::executor::TestExecutor;
use crate::resolve::backend::ResolverBackend;
use crate::resolve::cache::ResolverCache;
use crate::runtime::config::WorkerConfig;
use crate::runtime::fatal::{FatalErrorHandler, Supervisor};
use crate::runtime::telemetry::{self, Telemetry};
use crate::runtime::transport::WorkerTransport;
use crate::worker::dispatch::Dispatcher;
use crate::worker::types::{CoordinatorRequest, WorkerReply};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Drives one worker process: receives requests from the coordinator,
/// dispatches them, and replies until the coordinator closes the transport,
/// sends `Shutdown`, or the shutdown token is cancelled.
pub struct Runner<T: WorkerTransport> {
    dispatcher: Dispatcher,
    transport: T,
    telemetry: Arc<Telemetry>,
    config: WorkerConfig,
    shutdown: CancellationToken,
    fatal_handler: FatalErrorHandler,
}

impl<T: WorkerTransport> Runner<T> {
    /// Wires a dispatcher around the two external capabilities and a root
    /// [`CancellationToken`] that propagates through the reporter task and
    /// the request loop.
    pub fn new(
        config: WorkerConfig,
        backend: Arc<dyn ResolverBackend>,
        executor: Arc<dyn TestExecutor>,
        transport: T,
    ) -> Self {
        let telemetry = Arc::new(Telemetry::default());
        let shutdown = CancellationToken::new();
        let fatal_handler = FatalErrorHandler::new(shutdown.clone(), shutdown.child_token());
        let cache = ResolverCache::new(backend, Arc::clone(&telemetry));
        let dispatcher = Dispatcher::new(cache, executor, Arc::clone(&telemetry));

        Self {
            dispatcher,
            transport,
            telemetry,
            config,
            shutdown,
            fatal_handler,
        }
    }

    /// Returns a clone of the root shutdown token so embedders can integrate
    /// with their own signal handling.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn telemetry(&self) -> Arc<Telemetry> {
        Arc::clone(&self.telemetry)
    }

    /// Services requests until the conversation ends.
    ///
    /// A transport fault is unrecoverable: the worker can no longer reply
    /// reliably, so the fault goes through the fatal handler and out to the
    /// supervisor instead of being normalized into a per-request error.
    pub async fn run(&mut self) -> Result<()> {
        let reporter_token = self.shutdown.child_token();
        let reporter = telemetry::spawn_metrics_reporter(
            Arc::clone(&self.telemetry),
            reporter_token.clone(),
            self.config.metrics_interval(),
        );

        tracing::info!("worker request loop started");
        let outcome = self.serve().await;

        reporter_token.cancel();
        let _ = reporter.await;

        outcome.map_err(|error| self.fatal_handler.trigger("request loop", error))
    }

    async fn serve(&mut self) -> Result<()> {
        loop {
            let request = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("shutdown token cancelled; leaving request loop");
                    return Ok(());
                }
                received = self.transport.recv() => {
                    received.context("failed to receive coordinator request")?
                }
            };

            match request {
                Some(CoordinatorRequest::Setup(data)) => {
                    self.dispatcher.setup(Some(data)).await;
                }
                Some(CoordinatorRequest::Execute(request)) => {
                    let reply = match self.dispatcher.execute(request).await {
                        Ok(report) => WorkerReply::Report(report),
                        Err(error) => WorkerReply::Failure(error),
                    };
                    self.transport
                        .send(reply)
                        .await
                        .context("failed to send reply to coordinator")?;
                }
                Some(CoordinatorRequest::Shutdown) => {
                    tracing::info!("coordinator requested shutdown");
                    return Ok(());
                }
                None => {
                    tracing::info!("coordinator closed the transport; leaving request loop");
                    return Ok(());
                }
            }
        }
    }

    /// Runs until the conversation ends or a Ctrl-C (SIGINT) is received.
    pub async fn run_until_ctrl_c(&mut self) -> Result<()> {
        let shutdown = self.shutdown.clone();
        tokio::select! {
            outcome = self.run() => outcome,
            _ = signal::ctrl_c() => {
                tracing::info!("Ctrl-C received; shutting down worker");
                shutdown.cancel();
                Ok(())
            }
        }
    }

    /// Production entry point: the whole loop under the fatal guard. A fault
    /// that escapes every per-request path ends the process with status 1.
    pub async fn run_supervised(self) {
        self.run_supervised_with(Supervisor::new()).await;
    }

    pub async fn run_supervised_with(mut self, supervisor: Supervisor) {
        supervisor.run(self.run_until_ctrl_c()).await;
    }
}
