//! Convenient re-exports for downstream crates.

pub use crate::config::{BufferBackend, EngineConfig, LoadConfig, SyncPolicy};
pub use crate::error::{Error, Result};
pub use crate::hash::Hash256;
pub use crate::id::{PartitionId, SurrogateKey};
pub use crate::manifest::{ManifestId, RunManifest};
pub use crate::schema::{ColumnType, Field, LogicalType, PhysicalType, Schema};
pub use crate::types::{FixedWidth, PhysicalValue, Scalar};
