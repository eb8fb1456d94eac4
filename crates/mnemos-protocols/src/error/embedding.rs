//! Failures from turning text into vectors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The provider could not produce a vector (network, HTTP status, bad body).
    #[error("embedding provider failed: {0}")]
    Failed(String),

    #[error("cannot embed: {0}")]
    InvalidInput(String),

    #[error("provider returned {actual}-dimensional vector, store expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}
