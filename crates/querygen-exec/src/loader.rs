//! Raw table -> sealed column store + dictionaries.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use querygen_buffer::{
    ColumnStore, MemoryBudgetImpl, ParBuffer, ParMMapBuffer, ParMemoryBuffer, Partition,
};
use querygen_codegen::ExecContext;
use querygen_core::config::{BufferBackend, LoadConfig};
use querygen_core::id::PartitionId;
use querygen_core::schema::PhysicalType;
use querygen_core::types::PhysicalValue;
use querygen_encoding::{ColumnEncoder, Dictionaries};

use crate::error::{ExecError, Result};
use crate::table::RawTable;

/// A loaded table, ready to be read by units.
#[derive(Debug)]
pub struct LoadedTable {
    pub store: Arc<ColumnStore>,
    pub dictionaries: Dictionaries,
    mmap_dir: Option<PathBuf>,
}

impl LoadedTable {
    pub fn context(&self, parallelism: usize) -> Result<ExecContext> {
        Ok(ExecContext::new(Arc::clone(&self.store), self.dictionaries.clone())?
            .with_parallelism(parallelism))
    }

    pub fn num_rows(&self) -> usize {
        self.store.total_rows()
    }

    /// Directory holding this load's column files, if any column is mmap-backed.
    pub fn mmap_dir(&self) -> Option<&Path> {
        self.mmap_dir.as_deref()
    }
}

pub struct TableLoader {
    config: LoadConfig,
    budget: MemoryBudgetImpl,
}

impl TableLoader {
    pub fn new(config: LoadConfig, budget: MemoryBudgetImpl) -> Result<Self> {
        if config.rows_per_partition == 0 {
            return Err(ExecError::Config("rows_per_partition must be > 0".into()));
        }
        Ok(Self { config, budget })
    }

    pub fn budget(&self) -> &MemoryBudgetImpl {
        &self.budget
    }

    /// Encode every column (building one dictionary per string column), split
    /// rows into partitions and seal the result.
    ///
    /// Mmap-backed columns go to a fresh `load-<uuid>` directory under
    /// `mmap_dir`, so loads never share column files.
    pub fn load(&self, table: &RawTable) -> Result<LoadedTable> {
        let mmap_dir = self.mmap_dir_for(table)?;
        let mut dictionaries = Dictionaries::new();
        let mut encoded: Vec<(&str, PhysicalType, Vec<PhysicalValue>)> = Vec::new();
        for col in table.columns() {
            let mut enc = ColumnEncoder::new(col.column_type);
            let values = col
                .values
                .iter()
                .map(|v| enc.encode(v))
                .collect::<querygen_encoding::Result<Vec<_>>>()?;
            if let Some(dict) = enc.finish() {
                tracing::debug!(column = %col.name, distinct = dict.len(), "built dictionary");
                dictionaries.insert(col.name.clone(), dict);
            }
            encoded.push((col.name.as_str(), col.column_type.physical(), values));
        }

        let rows = table.num_rows();
        let per = self.config.rows_per_partition;
        let mut store = ColumnStore::new();
        for (i, start) in (0..rows).step_by(per).enumerate() {
            let end = (start + per).min(rows);
            let id = PartitionId::new(i as u64);
            let mut partition = Partition::new(id);
            for (name, physical, values) in &encoded {
                let rows_here = end - start;
                let mut buf =
                    self.buffer_for(name, *physical, id, rows_here, mmap_dir.as_deref())?;
                for v in &values[start..end] {
                    buf.append(*v)?;
                }
                partition.add_column(*name, buf)?;
            }
            store.push(partition);
        }
        store.seal_all()?;

        tracing::info!(
            rows,
            partitions = store.len(),
            columns = encoded.len(),
            "table loaded"
        );
        Ok(LoadedTable {
            store: Arc::new(store),
            dictionaries,
            mmap_dir,
        })
    }

    fn mmap_dir_for(&self, table: &RawTable) -> Result<Option<PathBuf>> {
        let mut mapped = table
            .columns()
            .iter()
            .filter(|c| self.config.backend_for(&c.name) == BufferBackend::Mmap)
            .peekable();
        if mapped.peek().is_none() {
            return Ok(None);
        }
        for col in mapped {
            check_file_component(&col.name)?;
        }
        let dir = Path::new(&self.config.mmap_dir).join(format!("load-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "mmap load directory");
        Ok(Some(dir))
    }

    fn buffer_for(
        &self,
        column: &str,
        physical: PhysicalType,
        partition: PartitionId,
        rows: usize,
        mmap_dir: Option<&Path>,
    ) -> Result<Box<dyn ParBuffer>> {
        let buf: Box<dyn ParBuffer> = match (self.config.backend_for(column), mmap_dir) {
            (BufferBackend::Mmap, Some(dir)) => {
                let path = dir.join(format!("{column}.p{}.qgc", partition.get()));
                Box::new(ParMMapBuffer::create(path, physical, rows, self.config.sync_policy)?)
            }
            (BufferBackend::Mmap, None) => {
                return Err(ExecError::Config(format!("no mmap directory for column '{column}'")))
            }
            (BufferBackend::Memory, _) => {
                Box::new(ParMemoryBuffer::new(&self.budget, physical, rows)?)
            }
        };
        Ok(buf)
    }
}

/// Column names become file names under the load directory.
fn check_file_component(column: &str) -> Result<()> {
    let reserved = column.is_empty() || column == "." || column == "..";
    if reserved || column.contains(['/', '\\', '\0']) {
        return Err(ExecError::Input(format!(
            "column '{column}' cannot name an mmap column file"
        )));
    }
    Ok(())
}
