//! Text to vector conversion.
//!
//! The store only sees this trait. Implementations live in the extension
//! crates: a deterministic local hasher and an OpenAI-compatible HTTP client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;

/// A vector produced for one input text, with its length recorded alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub dimension: usize,
}

impl Embedding {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            dimension: vector.len(),
            vector,
        }
    }
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    /// Embeds each text in order. Providers with a batch endpoint override this.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for &text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Length of every vector this provider returns.
    fn dimension(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl EmbeddingProvider for Echo {
        async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
            Ok(Embedding::new(vec![text.len() as f32, 1.0]))
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    #[test]
    fn dimension_tracks_vector_length() {
        assert_eq!(Embedding::new(vec![0.5; 4]).dimension, 4);
        assert_eq!(Embedding::new(Vec::new()).dimension, 0);
    }

    #[tokio::test]
    async fn batch_falls_back_to_sequential_embed() {
        let out = Echo.embed_batch(&["a", "bb", "ccc"]).await.unwrap();
        let lengths: Vec<f32> = out.iter().map(|e| e.vector[0]).collect();
        assert_eq!(lengths, vec![1.0, 2.0, 3.0]);
    }
}
