//! Seam with the external test-execution engine.

use crate::exec::fault::RunFailure;
use crate::exec::report::TestReport;
use crate::resolve::backend::SharedResolver;
use crate::runtime::config::{GlobalConfig, ProjectConfig};
use core::future::Future;
use core::pin::Pin;
use std::collections::HashSet;
use std::path::PathBuf;

pub type ExecFuture =
    Pin<Box<dyn Future<Output = Result<TestReport, RunFailure>> + Send + 'static>>;

/// Incremental hints handed to the execution engine, after wire normalization.
///
/// Serialized forms carry ordered lists; the engine expects set semantics, so
/// duplicates have already collapsed and order carries no meaning here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunContext {
    pub changed_files: Option<HashSet<PathBuf>>,
    pub source_map_fingerprints: Option<HashSet<String>>,
    pub watch_mode: bool,
}

/// Trait implemented by the sandboxed test-execution engine.
///
/// The dispatcher owns resolver caching and failure normalization; the engine
/// owns everything that happens inside the sandbox. Always async so it can
/// load files and evaluate sandboxed code.
pub trait TestExecutor: Send + Sync + 'static {
    /// Runs one test file. A report with failing assertions is a success;
    /// a [`RunFailure`] means the infrastructure itself broke.
    fn run(
        &self,
        path: PathBuf,
        global: GlobalConfig,
        project: ProjectConfig,
        resolver: SharedResolver,
        context: Option<RunContext>,
    ) -> ExecFuture;
}
