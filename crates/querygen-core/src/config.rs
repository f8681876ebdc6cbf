//! Engine configuration that downstream crates can serialize/deserialize.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Storage backend for one column's partition buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferBackend {
    Memory,
    Mmap,
}

impl BufferBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Some(BufferBackend::Memory),
            "mmap" => Some(BufferBackend::Mmap),
            _ => None,
        }
    }
}

/// When a memory-mapped buffer flushes dirty pages on the load path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPolicy {
    /// Flush once, when the buffer is sealed.
    OnSeal,
    /// Flush after every `n` appended rows, and on seal.
    EveryRows(u64),
    /// Never flush implicitly; callers use `flush()`.
    Manual,
}

impl SyncPolicy {
    /// Parse `on_seal`, `manual`, or `every:<rows>`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        match s {
            "on_seal" => Some(SyncPolicy::OnSeal),
            "manual" => Some(SyncPolicy::Manual),
            _ => {
                let n = s.strip_prefix("every:")?.parse::<u64>().ok()?;
                (n > 0).then_some(SyncPolicy::EveryRows(n))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hard cap (bytes) on memory-resident column buffers.
    pub mem_cap_bytes: usize,

    /// Rows per partition when loading a table.
    pub rows_per_partition: usize,

    /// Max partitions a query unit scans concurrently.
    pub max_parallel_tasks: usize,

    /// Backend for columns without an explicit override.
    pub default_backend: BufferBackend,

    /// Per-column backend overrides.
    #[serde(default)]
    pub column_backends: BTreeMap<String, BufferBackend>,

    /// Directory for memory-mapped column files.
    pub mmap_dir: String,

    /// Flush policy for memory-mapped buffers.
    pub sync_policy: SyncPolicy,

    /// If set, generated unit sources are written here.
    pub generated_dir: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mem_cap_bytes: 512 * 1024 * 1024, // 512MB
            rows_per_partition: 64 * 1024,
            max_parallel_tasks: 4,
            default_backend: BufferBackend::Memory,
            column_backends: BTreeMap::new(),
            mmap_dir: std::env::temp_dir()
                .join("querygen-mmap")
                .to_string_lossy()
                .into_owned(),
            sync_policy: SyncPolicy::OnSeal,
            generated_dir: None,
        }
    }
}

/// Snapshot of the settings the load path needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadConfig {
    pub rows_per_partition: usize,
    pub default_backend: BufferBackend,
    pub column_backends: BTreeMap<String, BufferBackend>,
    pub mmap_dir: String,
    pub sync_policy: SyncPolicy,
}

impl LoadConfig {
    pub fn backend_for(&self, column: &str) -> BufferBackend {
        self.column_backends
            .get(column)
            .copied()
            .unwrap_or(self.default_backend)
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `QUERYGEN_MEM_CAP_BYTES`: memory cap in bytes
    /// - `QUERYGEN_ROWS_PER_PARTITION`: rows per partition
    /// - `QUERYGEN_MAX_PARALLEL_TASKS`: max concurrently scanned partitions
    /// - `QUERYGEN_BACKEND`: `memory` or `mmap`
    /// - `QUERYGEN_COLUMN_BACKENDS`: `col=mmap,other=memory`
    /// - `QUERYGEN_MMAP_DIR`: directory for mapped column files
    /// - `QUERYGEN_SYNC_POLICY`: `on_seal`, `manual`, or `every:<rows>`
    /// - `QUERYGEN_GENERATED_DIR`: where generated sources are written
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("QUERYGEN_MEM_CAP_BYTES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.mem_cap_bytes = v;
            }
        }

        if let Ok(s) = std::env::var("QUERYGEN_ROWS_PER_PARTITION") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.rows_per_partition = v;
            }
        }

        if let Ok(s) = std::env::var("QUERYGEN_MAX_PARALLEL_TASKS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_parallel_tasks = v;
            }
        }

        if let Ok(s) = std::env::var("QUERYGEN_BACKEND") {
            if let Some(b) = BufferBackend::parse(&s) {
                cfg.default_backend = b;
            }
        }

        if let Ok(s) = std::env::var("QUERYGEN_COLUMN_BACKENDS") {
            cfg.column_backends.extend(parse_column_backends(&s));
        }

        if let Ok(s) = std::env::var("QUERYGEN_MMAP_DIR") {
            cfg.mmap_dir = s;
        }

        if let Ok(s) = std::env::var("QUERYGEN_SYNC_POLICY") {
            if let Some(p) = SyncPolicy::parse(&s) {
                cfg.sync_policy = p;
            }
        }

        if let Ok(s) = std::env::var("QUERYGEN_GENERATED_DIR") {
            cfg.generated_dir = Some(s);
        }

        cfg
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows_per_partition == 0 {
            return Err(Error::Config("rows_per_partition must be > 0".into()));
        }
        if self.max_parallel_tasks == 0 {
            return Err(Error::Config("max_parallel_tasks must be > 0".into()));
        }
        Ok(())
    }

    /// Produce the load-path configuration snapshot.
    pub fn load_config(&self) -> LoadConfig {
        LoadConfig {
            rows_per_partition: self.rows_per_partition,
            default_backend: self.default_backend,
            column_backends: self.column_backends.clone(),
            mmap_dir: self.mmap_dir.clone(),
            sync_policy: self.sync_policy,
        }
    }
}

/// Parse `col=backend` pairs separated by commas; malformed pairs are skipped.
pub fn parse_column_backends(s: &str) -> BTreeMap<String, BufferBackend> {
    s.split(',')
        .filter_map(|pair| {
            let (col, backend) = pair.split_once('=')?;
            let col = col.trim();
            if col.is_empty() {
                return None;
            }
            Some((col.to_string(), BufferBackend::parse(backend)?))
        })
        .collect()
}
