use thiserror::Error;

/// Result type local to querygen-codegen.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A token in the template text, or a declared placeholder, has no binding.
    #[error("template '{template}': placeholder '{token}' is not bound")]
    UnboundPlaceholder { template: String, token: String },

    #[error("template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("invalid binding: {0}")]
    InvalidBinding(String),

    #[error("no unit registered under '{0}'")]
    UnknownUnit(String),

    #[error("unit '{unit}': {violation}")]
    Lifecycle {
        unit: String,
        violation: LifecycleViolation,
    },

    #[error("buffer error: {0}")]
    Buffer(#[from] querygen_buffer::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] querygen_encoding::Error),

    #[error("execution error: {0}")]
    Exec(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleViolation {
    #[error("run called twice; units are single-shot")]
    AlreadyRun,
}

impl From<querygen_trie::Error> for Error {
    fn from(e: querygen_trie::Error) -> Self {
        Error::Encoding(e.into())
    }
}

impl From<querygen_core::error::Error> for Error {
    fn from(e: querygen_core::error::Error) -> Self {
        Error::InvalidBinding(e.to_string())
    }
}
