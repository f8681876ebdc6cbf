//! YAML query files.
//!
//! Example:
//! ```yaml
//! template: group_count
//! table:
//!   source: words.csv
//!   schema:
//!     - { name: word, type: Utf8 }
//!     - { name: score, type: Int64 }
//! bind:
//!   KEY: { column: word, hash: MIX64 }
//!   AGG: { annotation: count }
//! config:
//!   rows_per_partition: 1024
//!   backend: mmap
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use querygen_codegen::{builtin, Annotation, AttributeBinding, Binding, Template, BUILTIN_IDS};
use querygen_core::config::{BufferBackend, EngineConfig, SyncPolicy};
use querygen_core::schema::{ColumnType, Field, LogicalType, PhysicalType, Schema};
use querygen_encoding::HashKind;

#[derive(Debug, thiserror::Error)]
pub enum QueryFileError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unknown template '{0}' (built-ins: {1})")]
    UnknownTemplate(String, String),

    #[error("field '{field}': {reason}")]
    Field { field: String, reason: String },

    #[error("slot '{slot}': {reason}")]
    Slot { slot: String, reason: String },

    #[error("config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, QueryFileError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryFile {
    pub template: String,
    pub table: TableDef,
    pub bind: BTreeMap<String, SlotDef>,
    #[serde(default)]
    pub config: Option<QueryConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDef {
    /// CSV path, relative to the query file.
    pub source: String,
    pub schema: Vec<FieldDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub physical: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotDef {
    Attribute {
        column: String,
        #[serde(default)]
        hash: Option<String>,
    },
    Annotation {
        annotation: String,
    },
    Literal {
        literal: String,
    },
}

/// Overrides applied on top of `EngineConfig::from_env()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub mem_cap_bytes: Option<usize>,
    #[serde(default)]
    pub rows_per_partition: Option<usize>,
    #[serde(default)]
    pub max_parallel_tasks: Option<usize>,
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub column_backends: BTreeMap<String, String>,
    #[serde(default)]
    pub mmap_dir: Option<String>,
    #[serde(default)]
    pub sync_policy: Option<String>,
    #[serde(default)]
    pub generated_dir: Option<String>,
}

impl QueryFile {
    pub fn parse(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Resolve `table.source` against the directory holding the query file.
    pub fn source_path(&self, query_path: &Path) -> PathBuf {
        let source = Path::new(&self.table.source);
        if source.is_absolute() {
            return source.to_path_buf();
        }
        query_path
            .parent()
            .map_or_else(|| source.to_path_buf(), |dir| dir.join(source))
    }

    pub fn template(&self) -> Result<Template> {
        builtin(&self.template).ok_or_else(|| {
            QueryFileError::UnknownTemplate(self.template.clone(), BUILTIN_IDS.join(", "))
        })
    }

    pub fn schema(&self) -> Result<Schema> {
        let fields = self
            .table
            .schema
            .iter()
            .map(|f| {
                let err = |reason: String| QueryFileError::Field {
                    field: f.name.clone(),
                    reason,
                };
                let logical = LogicalType::parse(&f.data_type)
                    .ok_or_else(|| err(format!("unknown type '{}'", f.data_type)))?;
                let column_type = match &f.physical {
                    None => ColumnType::of(logical),
                    Some(p) => {
                        let physical = PhysicalType::parse(p)
                            .ok_or_else(|| err(format!("unknown physical type '{p}'")))?;
                        ColumnType::new(logical, physical).map_err(|e| err(e.to_string()))?
                    }
                };
                Ok(Field::new(f.name.clone(), column_type))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Schema::new(fields))
    }

    pub fn binding(&self, schema: &Schema) -> Result<Binding> {
        let mut binding = Binding::new();
        for (slot, def) in &self.bind {
            let err = |reason: String| QueryFileError::Slot {
                slot: slot.clone(),
                reason,
            };
            binding = match def {
                SlotDef::Attribute { column, hash } => {
                    let field = schema
                        .index_of(column)
                        .and_then(|i| schema.field(i))
                        .ok_or_else(|| err(format!("no column '{column}' in table schema")))?;
                    let hash = match hash {
                        None => HashKind::Fx,
                        Some(h) => HashKind::parse(h)
                            .ok_or_else(|| err(format!("unknown hash strategy '{h}'")))?,
                    };
                    binding.attribute(
                        slot.clone(),
                        AttributeBinding::new(column.clone(), field.column_type, hash),
                    )
                }
                SlotDef::Annotation { annotation } => {
                    let ann = Annotation::parse(annotation)
                        .ok_or_else(|| err(format!("unknown annotation '{annotation}'")))?;
                    binding.annotation(slot.clone(), ann)
                }
                SlotDef::Literal { literal } => binding.literal(slot.clone(), literal.clone()),
            };
        }
        Ok(binding)
    }

    pub fn apply_config(&self, cfg: &mut EngineConfig) -> Result<()> {
        let Some(qc) = &self.config else {
            return Ok(());
        };
        if let Some(v) = qc.mem_cap_bytes {
            cfg.mem_cap_bytes = v;
        }
        if let Some(v) = qc.rows_per_partition {
            cfg.rows_per_partition = v;
        }
        if let Some(v) = qc.max_parallel_tasks {
            cfg.max_parallel_tasks = v;
        }
        if let Some(b) = &qc.backend {
            cfg.default_backend = parse_backend(b)?;
        }
        for (col, b) in &qc.column_backends {
            cfg.column_backends.insert(col.clone(), parse_backend(b)?);
        }
        if let Some(dir) = &qc.mmap_dir {
            cfg.mmap_dir = dir.clone();
        }
        if let Some(p) = &qc.sync_policy {
            cfg.sync_policy = SyncPolicy::parse(p)
                .ok_or_else(|| QueryFileError::Config(format!("unknown sync policy '{p}'")))?;
        }
        if let Some(dir) = &qc.generated_dir {
            cfg.generated_dir = Some(dir.clone());
        }
        Ok(())
    }
}

pub fn parse_backend(s: &str) -> Result<BufferBackend> {
    BufferBackend::parse(s).ok_or_else(|| QueryFileError::Config(format!("unknown backend '{s}'")))
}
