//! Per-execution run manifest for audit and cache provenance.
//!
//! The host emits a manifest after a unit's result has been consumed. Two runs
//! of the same template and binding carry the same `fingerprint`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::Hash256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub Uuid);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub id: ManifestId,

    /// Template the unit was instantiated from.
    pub template: String,

    /// Generated unit (struct) name.
    pub unit_name: String,

    /// BLAKE3 of the generated source; the compiled-unit cache key.
    pub fingerprint: Hash256,

    /// Engine version string for provenance.
    pub engine_version: String,

    /// Whether the unit factory came from the cache.
    pub cache_hit: bool,

    /// Rows across all scanned partitions.
    pub rows_scanned: u64,

    /// Rows in the consumed result.
    pub result_rows: u64,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunManifest {
    pub fn new(
        template: impl Into<String>,
        unit_name: impl Into<String>,
        fingerprint: Hash256,
        started_ms: u64,
    ) -> Self {
        Self {
            id: ManifestId(Uuid::new_v4()),
            template: template.into(),
            unit_name: unit_name.into(),
            fingerprint,
            engine_version: crate::VERSION.to_string(),
            cache_hit: false,
            rows_scanned: 0,
            result_rows: 0,
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn finish(mut self, finished_ms: u64, rows_scanned: u64, result_rows: u64) -> Self {
        self.finished_ms = finished_ms;
        self.rows_scanned = rows_scanned;
        self.result_rows = result_rows;
        self
    }
}
