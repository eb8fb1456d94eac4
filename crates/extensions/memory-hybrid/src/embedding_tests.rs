use super::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer, dimension: usize) -> OpenAiEmbedding {
    OpenAiEmbedding::new(
        OpenAiEmbeddingConfig::new("test-key")
            .with_base_url(server.uri())
            .with_dimension(dimension)
            .with_timeout(Duration::from_secs(5)),
    )
    .unwrap()
}

#[test]
fn test_config_defaults() {
    let config = OpenAiEmbeddingConfig::new("test-key");
    assert_eq!(config.api_key, "test-key");
    assert_eq!(config.model, "text-embedding-3-small");
    assert_eq!(config.base_url, "https://api.openai.com/v1");
    assert_eq!(config.dimension, 384);
    assert_eq!(config.timeout, Duration::from_secs(30));
}

#[test]
fn test_config_builder() {
    let config = OpenAiEmbeddingConfig::new("key")
        .with_model("text-embedding-3-large")
        .with_dimension(3072)
        .with_base_url("https://custom.api.com")
        .with_timeout(Duration::from_secs(2));

    assert_eq!(config.model, "text-embedding-3-large");
    assert_eq!(config.dimension, 3072);
    assert_eq!(config.base_url, "https://custom.api.com");
    assert_eq!(config.timeout, Duration::from_secs(2));
}

#[tokio::test]
async fn test_embed_sends_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "text-embedding-3-small",
            "input": ["hello"],
            "dimensions": 3
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"index": 0, "embedding": [0.1, 0.2, 0.3]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let embedding = provider(&server, 3).embed("hello").await.unwrap();
    assert_eq!(embedding.dimension, 3);
    assert_eq!(embedding.vector, vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn test_batch_ordered_by_index() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ]
        })))
        .mount(&server)
        .await;

    let embeddings = provider(&server, 2)
        .embed_batch(&["first", "second"])
        .await
        .unwrap();
    assert_eq!(embeddings[0].vector, vec![1.0, 0.0]);
    assert_eq!(embeddings[1].vector, vec![0.0, 1.0]);
}

#[tokio::test]
async fn test_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let err = provider(&server, 3).embed("hello").await.unwrap_err();
    assert!(matches!(err, EmbeddingError::Failed(_)));
    assert!(err.to_string().contains("rate limited"));
}

#[tokio::test]
async fn test_dimension_mismatch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"index": 0, "embedding": [0.1, 0.2]}]
        })))
        .mount(&server)
        .await;

    let err = provider(&server, 3).embed("hello").await.unwrap_err();
    assert!(matches!(
        err,
        EmbeddingError::DimensionMismatch { expected: 3, actual: 2 }
    ));
}

#[tokio::test]
async fn test_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_json(json!({"data": [{"index": 0, "embedding": [1.0]}]})),
        )
        .mount(&server)
        .await;

    let provider = OpenAiEmbedding::new(
        OpenAiEmbeddingConfig::new("k")
            .with_base_url(server.uri())
            .with_dimension(1)
            .with_timeout(Duration::from_millis(200)),
    )
    .unwrap();
    let err = provider.embed("slow").await.unwrap_err();
    assert!(matches!(err, EmbeddingError::Failed(_)));
}

#[tokio::test]
async fn test_empty_input() {
    let server = MockServer::start().await;
    let provider = provider(&server, 3);

    assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    assert!(matches!(
        provider.embed("  ").await,
        Err(EmbeddingError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_fallback_wrapper_absorbs_failures() {
    use mnemos_memory_vector::{FallbackEmbedder, HashEmbedding};
    use std::sync::Arc;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let embedder = FallbackEmbedder::new(Arc::new(provider(&server, 16)));
    let vector = embedder.generate("offline text").await;
    assert_eq!(vector, HashEmbedding::new(16).embed_text("offline text"));
}
