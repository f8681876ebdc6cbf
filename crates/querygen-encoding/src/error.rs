use thiserror::Error;

/// Result type local to querygen-encoding.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A value outside its declared logical domain, or a binding/data mismatch.
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error(transparent)]
    Trie(#[from] querygen_trie::Error),
}

impl From<querygen_core::error::Error> for Error {
    fn from(e: querygen_core::error::Error) -> Self {
        match e {
            querygen_core::error::Error::Encoding(msg) => Error::Encoding(msg),
            other => Error::Encoding(other.to_string()),
        }
    }
}
