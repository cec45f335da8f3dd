//! Dispatch core: the `setup`/`execute` lifecycle the coordinator drives.

use crate::exec::executor::TestExecutor;
use crate::exec::fault::{RunFailure, SerializableError};
use crate::exec::report::TestReport;
use crate::resolve::backend::SharedResolver;
use crate::resolve::cache::ResolverCache;
use crate::resolve::module_map::ModuleMapSnapshot;
use crate::runtime::telemetry::Telemetry;
use crate::worker::types::{ExecutionRequest, SetupData};
use std::sync::Arc;

/// Owns the resolver cache and the execution-engine seam for one worker
/// process.
///
/// `setup` is expected at most once near start-up; `execute` runs once per
/// assigned test file for the lifetime of the process. Both take `&mut self`:
/// the coordinator dispatches one request at a time, and the cache underneath
/// is not safe for concurrent mutation.
pub struct Dispatcher {
    cache: ResolverCache,
    executor: Arc<dyn TestExecutor>,
    telemetry: Arc<Telemetry>,
}

impl Dispatcher {
    pub fn new(
        cache: ResolverCache,
        executor: Arc<dyn TestExecutor>,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        Self {
            cache,
            executor,
            telemetry,
        }
    }

    /// Eagerly populates the resolver cache from coordinator-side state.
    ///
    /// Best-effort: an entry whose module map fails to deserialize (or whose
    /// resolver fails to build) is logged and skipped, and must not prevent
    /// seeding the remaining entries. The lazy on-disk path stays correct for
    /// any project whose entry was dropped.
    pub async fn setup(&mut self, data: Option<SetupData>) {
        let Some(data) = data else {
            return;
        };

        for entry in data.preseed {
            let project = entry.configuration.name().to_owned();
            let snapshot = match ModuleMapSnapshot::from_serialized(entry.module_map_snapshot) {
                Ok(snapshot) => snapshot,
                Err(error) => {
                    self.telemetry.record_preseed_failure();
                    tracing::warn!(
                        project,
                        error = format!("{error:#}"),
                        "skipping malformed preseed entry"
                    );
                    continue;
                }
            };

            match self.cache.get(&entry.configuration, Some(snapshot)).await {
                Ok(_) => {
                    self.telemetry.record_preseeded_resolver();
                    tracing::debug!(project, "preseeded resolver from coordinator snapshot");
                }
                Err(error) => {
                    self.telemetry.record_preseed_failure();
                    tracing::warn!(
                        project,
                        error = format!("{error:#}"),
                        "failed to build preseeded resolver; will fall back to on-disk state"
                    );
                }
            }
        }
    }

    /// Runs one test file and returns its report.
    ///
    /// Every failure on the way — configuration validation, resolver
    /// construction, the sandboxed run itself — is normalized before it
    /// crosses back; the coordinator never sees a raw failure value.
    pub async fn execute(
        &mut self,
        request: ExecutionRequest,
    ) -> Result<TestReport, SerializableError> {
        let project = request.project.name().to_owned();
        let path = request.path.display().to_string();

        match self.run(request).await {
            Ok(report) => {
                self.telemetry.record_execution();
                Ok(report)
            }
            Err(failure) => {
                self.telemetry.record_execution_failure();
                let error = SerializableError::normalize(failure);
                tracing::warn!(project, path, error = %error, "test file execution failed");
                Err(error)
            }
        }
    }

    async fn run(&mut self, request: ExecutionRequest) -> Result<TestReport, RunFailure> {
        request.project.validate().map_err(RunFailure::from)?;

        let resolver: SharedResolver = self
            .cache
            .get(&request.project, None)
            .await
            .map_err(RunFailure::from)?;

        let context = request
            .context
            .map(|serialized| serialized.into_run_context());

        self.executor
            .run(
                request.path,
                request.global,
                request.project,
                resolver,
                context,
            )
            .await
    }

    pub fn cache(&self) -> &ResolverCache {
        &self.cache
    }
}
