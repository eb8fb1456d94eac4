//! Vector codec errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Blob length {len} is not a multiple of 4 bytes")]
    MisalignedBlob { len: usize },

    #[error("Vector element {index} is not a number")]
    NonNumeric { index: usize },

    #[error("Vector element {index} is not finite")]
    NonFinite { index: usize },

    #[error("Expected a numeric array or index-keyed object, got {0}")]
    NotAVector(String),

    #[error("Index-keyed vector is missing element {index}")]
    SparseIndex { index: usize },
}
