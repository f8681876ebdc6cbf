//! Partitions group equally long column buffers; a column store is the
//! ordered list of partitions a generated unit scans.

use std::collections::BTreeMap;

use querygen_core::id::PartitionId;
use querygen_core::schema::PhysicalType;

use crate::buffer::ParBuffer;
use crate::error::{Error, Result};

#[derive(Debug)]
pub struct Partition {
    id: PartitionId,
    columns: BTreeMap<String, Box<dyn ParBuffer>>,
    sealed: bool,
}

impl Partition {
    pub fn new(id: PartitionId) -> Self {
        Self {
            id,
            columns: BTreeMap::new(),
            sealed: false,
        }
    }

    pub fn id(&self) -> PartitionId {
        self.id
    }

    pub fn add_column(&mut self, name: impl Into<String>, buffer: Box<dyn ParBuffer>) -> Result<()> {
        if self.sealed {
            return Err(Error::SealedPartition(self.id));
        }
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(Error::DuplicateColumn(name));
        }
        self.columns.insert(name, buffer);
        Ok(())
    }

    pub fn column(&self, name: &str) -> Result<&dyn ParBuffer> {
        self.columns
            .get(name)
            .map(|b| &**b)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Rows in this partition (all columns agree once sealed).
    pub fn num_rows(&self) -> usize {
        self.columns.values().next().map_or(0, |b| b.len())
    }

    /// Seal every column after checking they hold the same number of rows.
    pub fn seal(&mut self) -> Result<()> {
        if self.sealed {
            return Ok(());
        }
        let expected = self.num_rows();
        if let Some((name, buf)) = self.columns.iter().find(|(_, b)| b.len() != expected) {
            return Err(Error::RowCountMismatch {
                partition: self.id,
                column: name.clone(),
                expected,
                got: buf.len(),
            });
        }
        for buf in self.columns.values_mut() {
            buf.seal()?;
        }
        self.sealed = true;
        tracing::trace!(partition = %self.id, rows = expected, "sealed partition");
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}

#[derive(Debug, Default)]
pub struct ColumnStore {
    partitions: Vec<Partition>,
}

impl ColumnStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, partition: Partition) {
        self.partitions.push(partition);
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn seal_all(&mut self) -> Result<()> {
        for p in &mut self.partitions {
            p.seal()?;
        }
        tracing::debug!(
            partitions = self.partitions.len(),
            rows = self.total_rows(),
            "column store sealed"
        );
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.partitions.iter().all(Partition::is_sealed)
    }

    pub fn total_rows(&self) -> usize {
        self.partitions.iter().map(Partition::num_rows).sum()
    }

    /// Physical type of `name`, which must agree across partitions.
    ///
    /// A store with no partitions has no columns.
    pub fn column_type(&self, name: &str) -> Result<PhysicalType> {
        let mut found: Option<PhysicalType> = None;
        for p in &self.partitions {
            let ty = p.column(name)?.physical_type();
            match found {
                Some(expected) if expected != ty => {
                    return Err(Error::TypeMismatch { expected, got: ty })
                }
                _ => found = Some(ty),
            }
        }
        found.ok_or_else(|| Error::MissingColumn(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::MemoryBudgetImpl;
    use crate::memory::ParMemoryBuffer;
    use querygen_core::types::PhysicalValue;

    fn col(budget: &MemoryBudgetImpl, vals: &[u32]) -> Box<dyn ParBuffer> {
        let vals: Vec<_> = vals.iter().copied().map(PhysicalValue::U32).collect();
        Box::new(ParMemoryBuffer::from_values(budget, PhysicalType::U32, &vals).unwrap())
    }

    #[test]
    fn seal_checks_row_counts() {
        let budget = MemoryBudgetImpl::new(1 << 12);
        let mut p = Partition::new(PartitionId::new(0));
        p.add_column("a", col(&budget, &[1, 2, 3])).unwrap();
        p.add_column("b", col(&budget, &[1, 2])).unwrap();
        let err = p.seal().unwrap_err();
        assert!(matches!(err, Error::RowCountMismatch { expected: 3, got: 2, .. }));
        assert!(!p.is_sealed());
    }

    #[test]
    fn duplicate_and_missing_columns() {
        let budget = MemoryBudgetImpl::new(1 << 12);
        let mut p = Partition::new(PartitionId::new(0));
        p.add_column("a", col(&budget, &[1])).unwrap();
        assert!(matches!(
            p.add_column("a", col(&budget, &[1])),
            Err(Error::DuplicateColumn(_))
        ));
        assert!(matches!(p.column("z"), Err(Error::MissingColumn(_))));
        p.seal().unwrap();
        assert!(matches!(
            p.add_column("c", col(&budget, &[1])),
            Err(Error::SealedPartition(_))
        ));
        assert!(p.column("a").unwrap().is_sealed());
    }

    #[test]
    fn store_totals_and_types() {
        let budget = MemoryBudgetImpl::new(1 << 12);
        let mut store = ColumnStore::new();
        for (i, vals) in [&[1u32, 2][..], &[3, 4, 5]].into_iter().enumerate() {
            let mut p = Partition::new(PartitionId::new(i as u64));
            p.add_column("k", col(&budget, vals)).unwrap();
            store.push(p);
        }
        assert!(!store.is_sealed());
        store.seal_all().unwrap();
        assert!(store.is_sealed());
        assert_eq!(store.total_rows(), 5);
        assert_eq!(store.column_type("k").unwrap(), PhysicalType::U32);
        assert!(store.column_type("nope").is_err());
    }
}
