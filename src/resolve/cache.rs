//! Per-process resolver cache keyed by project name.

use crate::resolve::backend::{ResolverBackend, SharedResolver};
use crate::resolve::module_map::ModuleMapSnapshot;
use crate::runtime::config::ProjectConfig;
use crate::runtime::telemetry::Telemetry;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps each project served by this worker to its constructed resolver.
///
/// Resolver construction is expensive; within one worker's lifetime the cost
/// is paid at most once per project unless the coordinator pushes a fresher
/// snapshot. Entries are never evicted, so a long-running worker holds one
/// entry per distinct project it has ever served — bounded by the number of
/// configured projects, not by request volume.
///
/// Single logical owner: calls are serialized by the coordinator's
/// one-request-at-a-time dispatch, which `&mut self` encodes. Not safe for
/// concurrent mutation from multiple simultaneous callers unless external
/// serialization is guaranteed.
pub struct ResolverCache {
    backend: Arc<dyn ResolverBackend>,
    telemetry: Arc<Telemetry>,
    entries: HashMap<String, SharedResolver>,
}

impl ResolverCache {
    pub fn new(backend: Arc<dyn ResolverBackend>, telemetry: Arc<Telemetry>) -> Self {
        Self {
            backend,
            telemetry,
            entries: HashMap::new(),
        }
    }

    /// Returns the resolver for `project`.
    ///
    /// With a snapshot, the resolver is always rebuilt and the cached entry
    /// replaced — the refresh path used when the coordinator holds fresher
    /// module-resolution state than the disk. Without one, the cached entry is
    /// returned unchanged when present; otherwise a snapshot is built from
    /// on-disk state first. At most one resolver is live per project.
    pub async fn get(
        &mut self,
        project: &ProjectConfig,
        snapshot: Option<ModuleMapSnapshot>,
    ) -> Result<SharedResolver> {
        let name = project.name();

        if let Some(snapshot) = snapshot {
            let resolver = self.backend.build_resolver(project, snapshot).await?;
            self.telemetry.record_resolver_build();
            self.entries.insert(name.to_owned(), Arc::clone(&resolver));
            return Ok(resolver);
        }

        if let Some(existing) = self.entries.get(name) {
            self.telemetry.record_resolver_cache_hit();
            return Ok(Arc::clone(existing));
        }

        let snapshot = self.backend.build_disk_snapshot(project).await?;
        let resolver = self.backend.build_resolver(project, snapshot).await?;
        self.telemetry.record_resolver_build();
        self.entries.insert(name.to_owned(), Arc::clone(&resolver));
        tracing::debug!(project = name, "built resolver from on-disk state");
        Ok(resolver)
    }

    pub fn contains(&self, project_name: &str) -> bool {
        self.entries.contains_key(project_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
