#![forbid(unsafe_code)]
//! querygen-core: shared vocabulary for the querygen workspace.
//!
//! Logical/physical column types, raw and physical values, strongly-typed ids,
//! stable hashing, engine configuration, the memory budget interfaces, and the
//! run manifest. Everything here is pure data; no I/O, no threads.

pub mod budget;
pub mod config;
pub mod error;
pub mod hash;
pub mod id;
pub mod manifest;
pub mod prelude;
pub mod schema;
pub mod types;

/// Version string stamped into run manifests and generated sources.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
