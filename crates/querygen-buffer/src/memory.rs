//! Memory-resident column buffer.

use querygen_core::config::BufferBackend;
use querygen_core::schema::PhysicalType;
use querygen_core::types::PhysicalValue;

use crate::budget::{MemoryBudgetImpl, OwnedBuf};
use crate::buffer::{check_append, ParBuffer};
use crate::error::{Error, Result};

#[derive(Debug)]
pub struct ParMemoryBuffer {
    physical: PhysicalType,
    buf: OwnedBuf,
    sealed: bool,
}

impl ParMemoryBuffer {
    /// Allocate room for `capacity` rows, charged to `budget` up front.
    pub fn new(budget: &MemoryBudgetImpl, physical: PhysicalType, capacity: usize) -> Result<Self> {
        let bytes = capacity
            .checked_mul(physical.width())
            .ok_or(Error::CapacityExceeded { capacity })?;
        Ok(Self {
            physical,
            buf: OwnedBuf::with_capacity(budget, bytes, "par_memory_buffer")?,
            sealed: false,
        })
    }

    /// Build an unsealed buffer holding exactly `values`.
    pub fn from_values(
        budget: &MemoryBudgetImpl,
        physical: PhysicalType,
        values: &[PhysicalValue],
    ) -> Result<Self> {
        let mut out = Self::new(budget, physical, values.len())?;
        for v in values {
            out.append(*v)?;
        }
        Ok(out)
    }
}

impl ParBuffer for ParMemoryBuffer {
    fn backend(&self) -> BufferBackend {
        BufferBackend::Memory
    }

    fn physical_type(&self) -> PhysicalType {
        self.physical
    }

    fn len(&self) -> usize {
        self.buf.len() / self.physical.width()
    }

    fn capacity(&self) -> usize {
        self.buf.accounted_bytes() / self.physical.width()
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    fn append(&mut self, value: PhysicalValue) -> Result<()> {
        check_append(&*self, &value)?;
        let mut scratch = Vec::with_capacity(self.physical.width());
        value.write_le(&mut scratch);
        if self.buf.try_extend(&scratch) {
            Ok(())
        } else {
            Err(Error::CapacityExceeded {
                capacity: self.capacity(),
            })
        }
    }

    fn reserve(&mut self, additional: usize) -> Result<()> {
        if self.sealed {
            return Err(Error::SealedBuffer);
        }
        let rows = self.len().saturating_add(additional);
        let bytes = rows
            .checked_mul(self.physical.width())
            .ok_or(Error::CapacityExceeded { capacity: rows })?;
        self.buf.try_grow(bytes)
    }

    fn seal(&mut self) -> Result<()> {
        self.sealed = true;
        Ok(())
    }

    fn is_sealed(&self) -> bool {
        self.sealed
    }
}
