#![forbid(unsafe_code)]
//! querygen-exec: reference host for generated query units.
//!
//! - [`TableLoader`] encodes a [`RawTable`] into a sealed column store and its
//!   dictionaries.
//! - [`Host`] takes a template and binding through generation, registration,
//!   execution and result decoding, emitting a run manifest.

pub mod error;
pub mod host;
pub mod interpret;
pub mod loader;
pub mod table;

pub use error::{ExecError, Result};
pub use host::{ExecutedUnit, Host, LoadedUnit, QueryOutput};
pub use interpret::{interpret, ResultRow};
pub use loader::{LoadedTable, TableLoader};
pub use table::{RawColumn, RawTable};
