//! Failures surfaced by `MemoryStore` operations.

use thiserror::Error;

use super::CodecError;

#[derive(Debug, Error)]
pub enum MemoryError {
    /// An operation ran before `initialize()` completed.
    #[error("memory store used before initialize()")]
    NotInitialized,

    #[error("rejected input: {0}")]
    InvalidInput(String),

    #[error("embedding blob unreadable: {0}")]
    Codec(#[from] CodecError),

    /// SQLite reported a failure while reading or writing rows.
    #[error("sqlite: {0}")]
    StorageError(String),

    #[error("malformed JSON: {0}")]
    SerializationError(String),

    /// The background connection thread is gone.
    #[error("database connection unavailable: {0}")]
    ConnectionError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for MemoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
