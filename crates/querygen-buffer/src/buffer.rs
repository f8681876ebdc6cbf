//! The backend-independent column buffer interface.

use std::fmt;

use querygen_core::config::BufferBackend;
use querygen_core::schema::PhysicalType;
use querygen_core::types::{FixedWidth, PhysicalValue};

use crate::error::{Error, Result};

/// A fixed-width column holding values of one physical type.
///
/// Rows are stored as contiguous little-endian values, so `as_bytes` has length
/// `len() * physical_type().width()` on every backend. Reads through `at` and
/// [`typed_values`] are identical whichever backend holds the bytes.
///
/// Capacity never grows implicitly: appending to a full buffer fails with
/// [`Error::CapacityExceeded`] until `reserve` is called.
pub trait ParBuffer: Send + Sync + fmt::Debug {
    fn backend(&self) -> BufferBackend;

    fn physical_type(&self) -> PhysicalType;

    /// Number of appended rows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows that fit without a `reserve`.
    fn capacity(&self) -> usize;

    /// Raw payload bytes of the appended rows.
    fn as_bytes(&self) -> &[u8];

    fn append(&mut self, value: PhysicalValue) -> Result<()>;

    /// Make room for at least `additional` more rows.
    fn reserve(&mut self, additional: usize) -> Result<()>;

    /// Forbid further appends. Idempotent.
    fn seal(&mut self) -> Result<()>;

    fn is_sealed(&self) -> bool;

    /// Persist pending writes. A no-op for memory-resident buffers.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn at(&self, row: usize) -> Result<PhysicalValue> {
        let len = self.len();
        if row >= len {
            return Err(Error::OutOfRange { row, len });
        }
        let ty = self.physical_type();
        let w = ty.width();
        PhysicalValue::read_le(ty, &self.as_bytes()[row * w..(row + 1) * w])
            .ok_or_else(|| Error::Corrupt(format!("row {row} is not a valid {ty:?} value")))
    }
}

/// Shared append-time checks: not sealed, matching type, room left.
pub(crate) fn check_append(buf: &dyn ParBuffer, value: &PhysicalValue) -> Result<()> {
    if buf.is_sealed() {
        return Err(Error::SealedBuffer);
    }
    let got = value.physical_type();
    if got != buf.physical_type() {
        return Err(Error::TypeMismatch {
            expected: buf.physical_type(),
            got,
        });
    }
    if buf.len() >= buf.capacity() {
        return Err(Error::CapacityExceeded {
            capacity: buf.capacity(),
        });
    }
    Ok(())
}

/// Iterate a buffer's rows as native values of `T`.
///
/// Fails with [`Error::TypeMismatch`] when `T` is not the buffer's physical type.
pub fn typed_values<T: FixedWidth>(
    buf: &dyn ParBuffer,
) -> Result<impl ExactSizeIterator<Item = T> + '_> {
    if T::PHYSICAL != buf.physical_type() {
        return Err(Error::TypeMismatch {
            expected: buf.physical_type(),
            got: T::PHYSICAL,
        });
    }
    Ok(buf
        .as_bytes()
        .chunks_exact(T::PHYSICAL.width())
        .map(T::read_le))
}
