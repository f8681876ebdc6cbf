use thiserror::Error;

use querygen_core::id::SurrogateKey;

/// Result type local to querygen-trie.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("unknown surrogate key {0}: never issued by this dictionary")]
    UnknownKey(SurrogateKey),

    #[error("dictionary is sealed; cannot intern '{0}'")]
    Sealed(String),

    #[error("dictionary is full: {nodes} trie nodes")]
    NodeLimit { nodes: usize },
}
