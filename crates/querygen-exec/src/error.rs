use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExecError>;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("codegen: {0}")]
    Codegen(#[from] querygen_codegen::Error),

    #[error("buffer: {0}")]
    Buffer(#[from] querygen_buffer::Error),

    #[error("encoding: {0}")]
    Encoding(#[from] querygen_encoding::Error),

    #[error("config: {0}")]
    Config(String),

    #[error("input: {0}")]
    Input(String),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("unit '{unit}' produced no result")]
    MissingResult { unit: String },

    #[error("unit '{unit}' result is not a {expected}")]
    ResultType { unit: String, expected: &'static str },

    #[error("serialization: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

impl From<querygen_core::error::Error> for ExecError {
    fn from(e: querygen_core::error::Error) -> Self {
        ExecError::Config(e.to_string())
    }
}
