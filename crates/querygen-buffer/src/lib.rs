#![deny(unsafe_code)]
//! querygen-buffer: column storage that generated query units read from.
//!
//! Two interchangeable backends implement [`ParBuffer`]:
//! - [`ParMemoryBuffer`]: one contiguous allocation, accounted against a hard
//!   [`MemoryBudgetImpl`].
//! - [`ParMMapBuffer`]: a memory-mapped column file with a small header.
//!
//! Both store the same little-endian fixed-width bytes, so a reader cannot tell
//! them apart. Buffers are appended to on the load path, then sealed; sealing
//! is the hand-off point to concurrent readers.
//!
//! `unsafe` is confined to the `mmap` module (mapping a file is inherently
//! unchecked by the compiler).

pub mod budget;
pub mod buffer;
pub mod error;
pub mod memory;
pub mod mmap;
pub mod partition;

pub use budget::{BudgetGuardImpl, MemoryBudgetImpl, OwnedBuf};
pub use buffer::{typed_values, ParBuffer};
pub use error::{Error, Result};
pub use memory::ParMemoryBuffer;
pub use mmap::ParMMapBuffer;
pub use partition::{ColumnStore, Partition};
