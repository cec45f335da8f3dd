//! Runtime glue that wires configs, telemetry, transport, fatal handling, and
//! runner orchestration.

pub mod config;
pub mod fatal;
pub mod runner;
pub mod telemetry;
pub mod transport;
