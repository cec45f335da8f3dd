//! Worker module split across focused submodules:
//! - `types`: wire payloads exchanged with the coordinator
//! - `dispatch`: dispatcher struct plus setup/execute logic
//! - `tests`: dispatcher unit tests

pub mod dispatch;
pub mod types;
