//! Serializable result of one sandboxed test-file run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of a completed test-file execution.
///
/// A report with failing assertions is still a *successful* execution: the
/// sandbox ran the file to completion and produced data. Only infrastructure
/// faults travel as [`crate::SerializableError`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReport {
    pub path: PathBuf,
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failure_messages: Vec<String>,
}

impl TestReport {
    /// Empty report for `path`; the executor fills in counts as it runs.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            passed: 0,
            failed: 0,
            skipped: 0,
            duration_ms: 0,
            failure_messages: Vec::new(),
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
