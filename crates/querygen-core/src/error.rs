use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A value or physical encoding outside its declared logical domain.
    #[error("Encoding error: {0}")]
    Encoding(String),
}
