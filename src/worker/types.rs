//! Wire payloads exchanged with the coordinator. The transport mechanism is
//! owned by the coordinator's worker pool; these shapes are the contract.

use crate::exec::executor::RunContext;
use crate::exec::fault::SerializableError;
use crate::exec::report::TestReport;
use crate::resolve::module_map::SerializedModuleMap;
use crate::runtime::config::{GlobalConfig, ProjectConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One unit of work: run one test file for one project.
///
/// Created by the coordinator, consumed once, never retained after the reply
/// is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    #[serde(rename = "configuration")]
    pub project: ProjectConfig,
    #[serde(rename = "globalConfiguration")]
    pub global: GlobalConfig,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<SerializedRunContext>,
}

/// Incremental hints as they travel on the wire.
///
/// Serialized forms carry ordered lists; [`into_run_context`] collapses them
/// into the set-semantics form the execution engine expects.
///
/// [`into_run_context`]: SerializedRunContext::into_run_context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedRunContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_files: Option<Vec<PathBuf>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_map_fingerprints: Option<Vec<String>>,
    #[serde(default)]
    pub watch_mode: bool,
}

impl SerializedRunContext {
    /// Converts the wire lists into sets. Duplicates collapse; order is
    /// discarded.
    pub fn into_run_context(self) -> RunContext {
        RunContext {
            changed_files: self
                .changed_files
                .map(|files| files.into_iter().collect()),
            source_map_fingerprints: self
                .source_map_fingerprints
                .map(|fingerprints| fingerprints.into_iter().collect()),
            watch_mode: self.watch_mode,
        }
    }
}

/// One preseed entry: a project plus the coordinator's serialized module map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreseedEntry {
    pub configuration: ProjectConfig,
    pub module_map_snapshot: SerializedModuleMap,
}

/// Payload of the optional `setup` call, sent at most once near start-up when
/// the coordinator holds fresher module-resolution state than the disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupData {
    #[serde(default)]
    pub preseed: Vec<PreseedEntry>,
}

/// Requests a worker can receive from its coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum CoordinatorRequest {
    Setup(SetupData),
    Execute(ExecutionRequest),
    Shutdown,
}

/// Replies a worker sends back, one per `Execute` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum WorkerReply {
    Report(TestReport),
    Failure(SerializableError),
}
