use thiserror::Error;

use querygen_core::id::PartitionId;
use querygen_core::schema::PhysicalType;

/// Result type local to querygen-buffer.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("row {row} out of range for buffer of length {len}")]
    OutOfRange { row: usize, len: usize },

    #[error("buffer is sealed; appends are no longer allowed")]
    SealedBuffer,

    #[error("physical type mismatch: buffer holds {expected:?}, got {got:?}")]
    TypeMismatch {
        expected: PhysicalType,
        got: PhysicalType,
    },

    #[error("buffer capacity of {capacity} rows exhausted; reserve before appending")]
    CapacityExceeded { capacity: usize },

    #[error("memory budget exceeded for tag '{tag}': requested {requested} bytes, capacity {capacity}, used {used}")]
    BudgetExceeded {
        tag: &'static str,
        requested: usize,
        capacity: usize,
        used: usize,
    },

    #[error("{partition}: column '{column}' has {got} rows, expected {expected}")]
    RowCountMismatch {
        partition: PartitionId,
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("{0} is sealed; columns can no longer be added")]
    SealedPartition(PartitionId),

    #[error("corrupt column file: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
