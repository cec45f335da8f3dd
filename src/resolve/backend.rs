//! Seams with the external module-resolution machinery. The resolution
//! algorithm and the filesystem crawler live outside this crate; workers only
//! consume them through these traits.

use crate::resolve::module_map::ModuleMapSnapshot;
use crate::runtime::config::ProjectConfig;
use anyhow::Result;
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type BackendFuture<T> = BoxFuture<'static, Result<T>>;

/// Resolution capability bound to one project and one snapshot generation.
///
/// Handles are shared by reference: the cache hands out clones of a single
/// `Arc`, so handle identity (`Arc::ptr_eq`) tells callers whether two runs
/// used the same resolver.
pub trait ModuleResolver: Send + Sync {
    /// Name of the project this resolver is bound to.
    fn project(&self) -> &str;

    /// Snapshot generation the resolver was built from.
    fn generation(&self) -> u64;

    /// Maps a module specifier, as written in `from`, to an absolute path.
    fn resolve(&self, specifier: &str, from: &Path) -> Option<PathBuf>;
}

pub type SharedResolver = Arc<dyn ModuleResolver>;

/// Constructs resolvers and module-map snapshots for the worker.
pub trait ResolverBackend: Send + Sync + 'static {
    /// Builds a resolver for `project` from an existing snapshot.
    fn build_resolver(
        &self,
        project: &ProjectConfig,
        snapshot: ModuleMapSnapshot,
    ) -> BackendFuture<SharedResolver>;

    /// Crawls current on-disk state and produces a fresh snapshot for
    /// `project`. Expensive; the cache calls this at most once per project
    /// unless the coordinator pushes newer snapshots.
    fn build_disk_snapshot(&self, project: &ProjectConfig) -> BackendFuture<ModuleMapSnapshot>;
}
