pub mod exec;
pub mod resolve;
pub mod runtime;
pub mod worker;

pub use exec::executor::{ExecFuture, RunContext, TestExecutor};
pub use exec::fault::{RunFailure, SerializableError};
pub use exec::report::TestReport;
pub use resolve::backend::{BackendFuture, ModuleResolver, ResolverBackend, SharedResolver};
pub use resolve::cache::ResolverCache;
pub use resolve::module_map::{ModuleMapSnapshot, SerializedModuleMap};
pub use runtime::config::{
    GlobalConfig, ProjectConfig, WorkerConfig, WorkerConfigBuilder, WorkerConfigParams,
};
pub use runtime::fatal::{FatalErrorHandler, ProcessTerminator, Supervisor, Terminator};
pub use runtime::runner::Runner;
pub use runtime::telemetry::{init_tracing, Telemetry, TelemetrySnapshot};
pub use runtime::transport::{
    transport_channel, ChannelTransport, CoordinatorEnd, TransportFuture, WorkerTransport,
};
pub use worker::dispatch::Dispatcher;
pub use worker::types::{
    CoordinatorRequest, ExecutionRequest, PreseedEntry, SerializedRunContext, SetupData,
    WorkerReply,
};
