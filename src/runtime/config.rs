//! Configuration shapes: the two coordinator-supplied configs that travel
//! with requests, and the worker process's own tuning knobs.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::runtime::telemetry;

const DEFAULT_TRANSPORT_CAPACITY: usize = 16;

/// Per-project configuration, supplied by the coordinator with every request.
///
/// `name` is the project's identity: stable and unique across the
/// coordinator's lifetime, and the resolver cache key on this side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    name: String,
    root_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    module_roots: Vec<PathBuf>,
}

impl ProjectConfig {
    pub fn new(name: impl Into<String>, root_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root_dir: root_dir.into(),
            display_name: None,
            module_roots: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_module_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.module_roots = roots;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn module_roots(&self) -> &[PathBuf] {
        &self.module_roots
    }

    /// A config that fails here cannot identify a cache entry or anchor a
    /// module crawl; the dispatcher surfaces it as a resolution failure.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("project name cannot be empty");
        }
        if self.root_dir.as_os_str().is_empty() {
            bail!("project root_dir cannot be empty");
        }
        Ok(())
    }
}

/// Run-wide configuration, forwarded to the execution engine untouched apart
/// from deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    pub root_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_timeout_ms: Option<u64>,
    #[serde(default)]
    pub verbose: bool,
}

impl GlobalConfig {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            test_timeout_ms: None,
            verbose: false,
        }
    }
}

/// Tuning for the worker process itself.
///
/// All instances must be constructed via [`WorkerConfig::builder`] or
/// [`WorkerConfig::new`] so invariants are validated before any consumer
/// observes the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    metrics_interval: Duration,
    transport_capacity: usize,
}

pub struct WorkerConfigParams {
    pub metrics_interval: Duration,
    pub transport_capacity: usize,
}

impl WorkerConfig {
    /// Returns a builder to incrementally construct and validate a
    /// configuration.
    pub fn builder() -> WorkerConfigBuilder {
        WorkerConfigBuilder::default()
    }

    pub fn new(params: WorkerConfigParams) -> Result<Self> {
        let WorkerConfigParams {
            metrics_interval,
            transport_capacity,
        } = params;

        let config = Self {
            metrics_interval,
            transport_capacity,
        };

        config.validate()?;
        Ok(config)
    }

    /// Interval used by the telemetry reporter.
    pub fn metrics_interval(&self) -> Duration {
        self.metrics_interval
    }

    /// Channel capacity used by the in-process transport.
    pub fn transport_capacity(&self) -> usize {
        self.transport_capacity
    }

    pub fn validate(&self) -> Result<()> {
        if self.metrics_interval.is_zero() {
            bail!("metrics_interval must be greater than 0");
        }

        if self.transport_capacity == 0 {
            bail!("transport_capacity must be greater than 0");
        }

        Ok(())
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            metrics_interval: telemetry::DEFAULT_METRICS_INTERVAL,
            transport_capacity: DEFAULT_TRANSPORT_CAPACITY,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct WorkerConfigBuilder {
    metrics_interval: Option<Duration>,
    transport_capacity: Option<usize>,
}

impl WorkerConfigBuilder {
    pub fn metrics_interval(mut self, interval: Duration) -> Self {
        self.metrics_interval = Some(interval);
        self
    }

    pub fn transport_capacity(mut self, capacity: usize) -> Self {
        self.transport_capacity = Some(capacity);
        self
    }

    pub fn build(self) -> Result<WorkerConfig> {
        WorkerConfig::new(WorkerConfigParams {
            metrics_interval: self
                .metrics_interval
                .unwrap_or(telemetry::DEFAULT_METRICS_INTERVAL),
            transport_capacity: self.transport_capacity.unwrap_or(DEFAULT_TRANSPORT_CAPACITY),
        })
    }
}
