//! Embedding adapters.

use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use mnemos_protocols::{Embedding, EmbeddingError, EmbeddingProvider};

/// Deterministic bag-of-words embedding via feature hashing.
///
/// Each lower-cased alphanumeric token is hashed with SHA-256; the digest
/// picks a bucket and a sign. Texts sharing words point the same way, texts
/// sharing none are close to orthogonal. Output is L2-normalised and stable
/// across processes, platforms and toolchains.
#[derive(Debug, Clone)]
pub struct HashEmbedding {
    dimension: usize,
}

impl HashEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// Embed synchronously. Never fails.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in tokens(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for HashEmbedding {
    fn default() -> Self {
        Self::new(384)
    }
}

/// Lower-cased alphanumeric tokens with a plural `s` trimmed.
fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| {
            let lower = t.to_lowercase();
            if lower.len() > 3 && lower.ends_with('s') && !lower.ends_with("ss") {
                lower[..lower.len() - 1].to_string()
            } else {
                lower
            }
        })
}

#[async_trait]
impl EmbeddingProvider for HashEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        Ok(Embedding::new(self.embed_text(text)))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Never-failing embedder used by the store.
///
/// Delegates to an optional primary provider. When the primary errors or
/// returns a vector of the wrong dimensionality, the deterministic
/// [`HashEmbedding`] of the same dimensionality is returned instead.
#[derive(Clone)]
pub struct FallbackEmbedder {
    primary: Option<Arc<dyn EmbeddingProvider>>,
    fallback: HashEmbedding,
}

impl FallbackEmbedder {
    /// Wrap a primary provider; the fallback matches its dimension.
    pub fn new(primary: Arc<dyn EmbeddingProvider>) -> Self {
        let fallback = HashEmbedding::new(primary.dimension());
        Self {
            primary: Some(primary),
            fallback,
        }
    }

    /// Local hashing only.
    pub fn hash_only(dimension: usize) -> Self {
        Self {
            primary: None,
            fallback: HashEmbedding::new(dimension),
        }
    }

    pub fn dimension(&self) -> usize {
        self.fallback.dimension
    }

    /// Generate an embedding for `text`. Never fails.
    pub async fn generate(&self, text: &str) -> Vec<f32> {
        let Some(primary) = &self.primary else {
            return self.fallback.embed_text(text);
        };

        match primary.embed(text).await {
            Ok(embedding) if embedding.vector.len() == self.dimension() => embedding.vector,
            Ok(embedding) => {
                let err = EmbeddingError::DimensionMismatch {
                    expected: self.dimension(),
                    actual: embedding.vector.len(),
                };
                warn!("Primary embedding rejected, using hash fallback: {}", err);
                self.fallback.embed_text(text)
            }
            Err(err) => {
                warn!("Primary embedding failed, using hash fallback: {}", err);
                self.fallback.embed_text(text)
            }
        }
    }
}

impl std::fmt::Debug for FallbackEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackEmbedder")
            .field("has_primary", &self.primary.is_some())
            .field("dimension", &self.dimension())
            .finish()
    }
}

#[async_trait]
impl EmbeddingProvider for FallbackEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let vector = self.generate(text).await;
        debug!("Generated {}-dimensional embedding", vector.len());
        Ok(Embedding::new(vector))
    }

    fn dimension(&self) -> usize {
        self.dimension()
    }
}

#[cfg(test)]
#[path = "embedding_tests.rs"]
mod tests;
