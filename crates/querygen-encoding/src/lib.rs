#![forbid(unsafe_code)]
//! querygen-encoding: raw values ⇄ fixed-width physical values, and the hash
//! strategies shared by dictionary construction and generated aggregation code.
//!
//! Strings never reach a column buffer: they are interned into the column's
//! [`Trie`](querygen_trie::Trie) and stored as surrogate keys of the column's
//! physical width.

pub mod dictionaries;
pub mod encoding;
pub mod error;
pub mod hash;

pub use dictionaries::Dictionaries;
pub use encoding::{decode, encode, ColumnEncoder};
pub use error::{Error, Result};
pub use hash::{hash, Blake3, Fx, HashKind, HashStrategy, Mix64, StrategyBuildHasher, StrategyHasher};
