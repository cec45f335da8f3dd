//! Module-resolution boundary: the resolver/backend seams, the serializable
//! module-map snapshot, and the per-process resolver cache.

pub mod backend;
pub mod cache;
pub mod module_map;
