use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Malformed record {record}: {reason}")]
    MalformedRecord { record: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Index {index} is out of range for a set of {len} transactions")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Duplicate candidate at index {index} no longer matches the transaction set; re-run detection")]
    StaleCandidate { index: usize },

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
