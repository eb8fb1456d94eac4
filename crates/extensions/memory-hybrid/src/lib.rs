//! Hybrid semantic memory store.
//!
//! A single SQLite file holds free-text memories together with their
//! embeddings. Three retrieval modes share it:
//!
//! - **Vector search**: exhaustive cosine-similarity scan over stored embeddings
//! - **Keyword search**: FTS5 BM25 ranking over an index mirrored by triggers
//! - **Hybrid search**: both legs over-fetched, keyword scores normalized per
//!   batch, then linearly combined with caller-supplied weights
//!
//! ## Lifecycle
//!
//! 1. [`MemoryStore::open`] (or [`MemoryStore::open_in_memory`])
//! 2. [`MemoryStore::initialize`] creates or upgrades the schema, probes
//!    optional engine features and imports the legacy log if present
//! 3. reads and writes
//! 4. [`MemoryStore::close`]

mod embedding;
mod fts;
mod fusion;
mod hybrid;
mod maintenance;
mod migration;
mod schema;
mod store;
mod vector;

#[cfg(test)]
mod testing;

pub use embedding::{OpenAiEmbedding, OpenAiEmbeddingConfig};
pub use fts::escape_fts_query;
pub use fusion::{linear_fusion, FusionConfig, FusionWeights};
pub use schema::SchemaReport;
pub use store::{MemoryStore, StoreOptions};
