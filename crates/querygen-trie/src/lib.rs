#![forbid(unsafe_code)]
//! querygen-trie: the string dictionary behind `Utf8` columns.
//!
//! A [`Trie`] maps each distinct string to a dense [`SurrogateKey`] issued in
//! insertion order and maps keys back to strings by walking parent links.
//! Construction is single-writer (`&mut self`); once [`Trie::seal`]ed the
//! structure is immutable and can be shared behind an `Arc` by any number of
//! readers without locking.

pub mod error;
pub mod iter;
pub mod trie;

pub use error::{Error, Result};
pub use iter::PrefixIter;
pub use trie::Trie;

pub use querygen_core::id::SurrogateKey;
