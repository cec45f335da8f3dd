use once_cell::sync::Lazy;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use testrig::{
    BackendFuture, ExecFuture, ExecutionRequest, GlobalConfig, ModuleMapSnapshot, ModuleResolver,
    ProjectConfig, ResolverBackend, RunContext, RunFailure, SerializedModuleMap, SharedResolver,
    Terminator, TestExecutor, TestReport, TransportFuture, WorkerTransport,
};
use tracing_subscriber::EnvFilter;

static TRACING_SUBSCRIBER: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
});

pub fn init_tracing() {
    Lazy::force(&TRACING_SUBSCRIBER);
}

pub struct StaticResolver {
    project: String,
    generation: u64,
}

impl ModuleResolver for StaticResolver {
    fn project(&self) -> &str {
        &self.project
    }

    fn generation(&self) -> u64 {
        self.generation
    }

    fn resolve(&self, _specifier: &str, _from: &Path) -> Option<PathBuf> {
        None
    }
}

/// Backend double that hands out [`StaticResolver`]s and records every
/// resolver it built, so tests can assert handle identity downstream.
#[derive(Default)]
pub struct RecordingBackend {
    disk_builds: AtomicU64,
    built: Mutex<Vec<SharedResolver>>,
}

impl RecordingBackend {
    pub fn disk_builds(&self) -> u64 {
        self.disk_builds.load(Ordering::SeqCst)
    }

    pub fn built(&self) -> Vec<SharedResolver> {
        self.built.lock().unwrap().clone()
    }
}

impl ResolverBackend for RecordingBackend {
    fn build_resolver(
        &self,
        project: &ProjectConfig,
        snapshot: ModuleMapSnapshot,
    ) -> BackendFuture<SharedResolver> {
        let resolver: SharedResolver = Arc::new(StaticResolver {
            project: project.name().to_owned(),
            generation: snapshot.generation,
        });
        self.built.lock().unwrap().push(Arc::clone(&resolver));
        Box::pin(async move { Ok(resolver) })
    }

    fn build_disk_snapshot(&self, project: &ProjectConfig) -> BackendFuture<ModuleMapSnapshot> {
        self.disk_builds.fetch_add(1, Ordering::SeqCst);
        let snapshot = ModuleMapSnapshot {
            root: project.root_dir().to_owned(),
            generation: 0,
            modules: Default::default(),
            mocks: Default::default(),
        };
        Box::pin(async move { Ok(snapshot) })
    }
}

pub struct SeenRun {
    pub resolver: SharedResolver,
    pub context: Option<RunContext>,
}

/// Executor double that records what the dispatcher hands it and reports one
/// passed test per file.
#[derive(Default)]
pub struct RecordingExecutor {
    seen: Mutex<Vec<SeenRun>>,
}

impl RecordingExecutor {
    pub fn last_resolver(&self) -> SharedResolver {
        let seen = self.seen.lock().unwrap();
        Arc::clone(&seen.last().expect("executor should have run").resolver)
    }

    pub fn last_context(&self) -> Option<RunContext> {
        let seen = self.seen.lock().unwrap();
        seen.last().expect("executor should have run").context.clone()
    }
}

impl TestExecutor for RecordingExecutor {
    fn run(
        &self,
        path: PathBuf,
        _global: GlobalConfig,
        _project: ProjectConfig,
        resolver: SharedResolver,
        context: Option<RunContext>,
    ) -> ExecFuture {
        let mut report = TestReport::new(path);
        report.passed = 1;
        self.seen.lock().unwrap().push(SeenRun { resolver, context });
        Box::pin(async move { Ok(report) })
    }
}

/// Executor double that fails every run with a fixed failure.
pub struct FailingExecutor {
    failure: RunFailure,
}

impl FailingExecutor {
    pub fn new(failure: RunFailure) -> Self {
        Self { failure }
    }
}

impl TestExecutor for FailingExecutor {
    fn run(
        &self,
        _path: PathBuf,
        _global: GlobalConfig,
        _project: ProjectConfig,
        _resolver: SharedResolver,
        _context: Option<RunContext>,
    ) -> ExecFuture {
        let failure = self.failure.clone();
        Box::pin(async move { Err(failure) })
    }
}

/// Terminator double so supervisor tests can observe the exit status without
/// killing the test process.
#[derive(Default)]
pub struct RecordingTerminator {
    status: AtomicI32,
}

impl RecordingTerminator {
    pub fn status(&self) -> i32 {
        self.status.load(Ordering::SeqCst)
    }
}

impl Terminator for RecordingTerminator {
    fn terminate(&self, status: i32) {
        self.status.store(status, Ordering::SeqCst);
    }
}

/// Transport double whose receive side is already broken.
pub struct FailingTransport;

impl WorkerTransport for FailingTransport {
    fn recv(&mut self) -> TransportFuture<'_, Option<testrig::CoordinatorRequest>> {
        Box::pin(async { Err(anyhow::anyhow!("worker pipe torn down")) })
    }

    fn send(&mut self, _reply: testrig::WorkerReply) -> TransportFuture<'_, ()> {
        Box::pin(async { Err(anyhow::anyhow!("worker pipe torn down")) })
    }
}

pub fn execution_request(project: &str, path: &str) -> ExecutionRequest {
    ExecutionRequest {
        project: ProjectConfig::new(project, "/repo"),
        global: GlobalConfig::new("/repo"),
        path: PathBuf::from(path),
        context: None,
    }
}

pub fn serialized_snapshot(generation: u64) -> SerializedModuleMap {
    json!({
        "root": "/repo",
        "generation": generation,
        "modules": {"app": "/repo/src/app.js"},
    })
}
