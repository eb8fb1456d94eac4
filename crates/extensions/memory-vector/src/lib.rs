//! Vector primitives for the mnemos memory store.
//!
//! - [`codec`]: stable binary form of `f32` embeddings for BLOB columns
//! - [`cosine_similarity`] and [`VectorRanker`]: exhaustive linear-scan ranking
//! - [`HashEmbedding`] and [`FallbackEmbedder`]: the deterministic local
//!   embedder and the never-failing wrapper the write path relies on

pub mod codec;
mod embedding;
mod ranking;
mod similarity;

pub use embedding::{FallbackEmbedder, HashEmbedding};
pub use ranking::{compare_ranked, RankedHit, VectorRanker};
pub use similarity::cosine_similarity;
