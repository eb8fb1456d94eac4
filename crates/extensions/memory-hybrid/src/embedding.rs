//! Remote embeddings over the OpenAI `/embeddings` wire format.
//!
//! Works with any service speaking the same protocol (Azure, local gateways).
//! The requested `dimensions` must match the store's configured dimension,
//! vectors of any other length are rejected.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use mnemos_protocols::{Embedding, EmbeddingError, EmbeddingProvider};

const DEFAULT_MODEL: &str = "text-embedding-3-small";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Output length, sent as `dimensions`.
    pub dimension: usize,
    /// Whole-request deadline.
    pub timeout: Duration,
}

impl OpenAiEmbeddingConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            dimension: 384,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}

pub struct OpenAiEmbedding {
    http: reqwest::Client,
    config: OpenAiEmbeddingConfig,
}

impl OpenAiEmbedding {
    pub fn new(config: OpenAiEmbeddingConfig) -> Result<Self, EmbeddingError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmbeddingError::Failed(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    async fn request(&self, texts: &[&str]) -> Result<Vec<WireItem>, EmbeddingError> {
        let body = WireRequest {
            model: &self.config.model,
            input: texts,
            dimensions: self.config.dimension,
        };

        let response = self
            .http
            .post(self.config.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbeddingError::Failed(format!("POST {}: {e}", self.config.endpoint())))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Failed(format!("HTTP {status}: {detail}")));
        }

        let mut items = response
            .json::<WireResponse>()
            .await
            .map_err(|e| EmbeddingError::Failed(format!("undecodable response: {e}")))?
            .data;
        items.sort_by_key(|item| item.index);
        Ok(items)
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    dimensions: usize,
}

#[derive(Deserialize)]
struct WireResponse {
    data: Vec<WireItem>,
}

#[derive(Deserialize)]
struct WireItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        match self.embed_batch(&[text]).await?.pop() {
            Some(embedding) => Ok(embedding),
            None => Err(EmbeddingError::Failed("response carried no vectors".to_string())),
        }
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(pos) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(EmbeddingError::InvalidInput(format!("text {pos} is blank")));
        }

        let items = self.request(texts).await?;
        if items.len() != texts.len() {
            return Err(EmbeddingError::Failed(format!(
                "sent {} texts, received {} vectors",
                texts.len(),
                items.len()
            )));
        }
        debug!(count = items.len(), model = %self.config.model, "Embedded batch");

        let expected = self.config.dimension;
        items
            .into_iter()
            .map(|item| match item.embedding.len() {
                actual if actual == expected => Ok(Embedding::new(item.embedding)),
                actual => Err(EmbeddingError::DimensionMismatch { expected, actual }),
            })
            .collect()
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}

#[cfg(test)]
#[path = "embedding_tests.rs"]
mod tests;
