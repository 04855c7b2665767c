use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid format: expected a JSON array of restaurants")]
    InvalidFormat,

    #[error("invalid weight {0}: weights must be finite and not negative")]
    InvalidWeight(f64),
}

pub type Result<T> = std::result::Result<T, Error>;
