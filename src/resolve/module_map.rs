//! Serializable snapshot of a project's resolved module graph.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Transportable form of a [`ModuleMapSnapshot`], as it crosses the process
/// boundary inside a preseed payload.
pub type SerializedModuleMap = serde_json::Value;

/// Immutable index of a project's source files at a point in time.
///
/// Produced by the external module-map builder, either on the coordinator
/// side (watch mode, shipped through `setup`) or on this side by crawling the
/// disk. Consumed only to construct or refresh a resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleMapSnapshot {
    pub root: PathBuf,
    pub generation: u64,
    pub modules: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub mocks: BTreeMap<String, PathBuf>,
}

impl ModuleMapSnapshot {
    pub fn from_serialized(value: SerializedModuleMap) -> Result<Self> {
        serde_json::from_value(value).context("failed to deserialize module map snapshot")
    }

    pub fn into_serialized(self) -> Result<SerializedModuleMap> {
        serde_json::to_value(self).context("failed to serialize module map snapshot")
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
