//! # Mnemos Protocols
//!
//! Shared definitions for the mnemos memory store.
//! Contains the data model and interface traits - no storage implementations.
//!
//! ## Contents
//!
//! - [`MemoryRecord`] - The durable unit stored by a memory backend
//! - [`MemoryMetadata`] - Typed provenance metadata with an open extension map
//! - [`SearchResult`] - Ranked output of vector, keyword and hybrid search
//! - [`EmbeddingProvider`] - Trait for text to vector services
//! - [`OperationReport`] - Per-item accumulator for bulk operations

pub mod embedding;
pub mod error;
pub mod memory;
pub mod timestamp;

pub use embedding::{Embedding, EmbeddingProvider};
pub use error::{CodecError, EmbeddingError, MemoryError};
pub use memory::{
    AddedMemory, EngineCapabilities, HybridSearchOptions, ItemFailure, KeywordSearchOptions,
    MemoryMetadata, MemoryRecord, MemoryStats, OperationReport, SearchResult,
    VectorSearchOptions, DEFAULT_MEMORY_TYPE,
};
