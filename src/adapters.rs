//! Wiring from configuration to the store.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use mnemos_config::{Config, EmbeddingProviderKind, SearchConfig};
use mnemos_memory_hybrid::{FusionConfig, MemoryStore, OpenAiEmbedding, OpenAiEmbeddingConfig, StoreOptions};
use mnemos_memory_vector::FallbackEmbedder;
use mnemos_protocols::{HybridSearchOptions, KeywordSearchOptions, VectorSearchOptions};

/// Engine options from `[store]` and `[search]`.
pub(crate) fn store_options(config: &Config, migrate_on_startup: bool) -> StoreOptions {
    StoreOptions {
        full_text: config.store.full_text,
        cache_size_kib: config.store.cache_size_kib,
        busy_timeout_ms: config.store.busy_timeout_ms,
        legacy_log_path: if migrate_on_startup {
            config.store.legacy_log_path.clone()
        } else {
            None
        },
        fusion: FusionConfig {
            overfetch_factor: config.search.overfetch_factor,
            vector_leg_min_score: config.search.hybrid_vector_min_score,
        },
    }
}

/// The configured embedding provider behind the hash fallback.
pub(crate) fn build_embedder(config: &Config) -> anyhow::Result<FallbackEmbedder> {
    let dimension = config.store.embedding_dimension;
    match config.embedding.provider {
        EmbeddingProviderKind::Hash => Ok(FallbackEmbedder::hash_only(dimension)),
        EmbeddingProviderKind::OpenAi => {
            let api_key = config
                .embedding
                .api_key
                .clone()
                .context("embedding.api_key is required for the openai provider")?;
            let provider = OpenAiEmbedding::new(
                OpenAiEmbeddingConfig::new(api_key)
                    .with_model(config.embedding.model.clone())
                    .with_base_url(config.embedding.base_url.clone())
                    .with_dimension(dimension)
                    .with_timeout(Duration::from_secs(config.embedding.timeout_secs)),
            )?;
            Ok(FallbackEmbedder::new(Arc::new(provider)))
        }
    }
}

/// Open and initialize the configured store.
pub(crate) async fn open_store(
    config: &Config,
    migrate_on_startup: bool,
) -> anyhow::Result<MemoryStore> {
    let embedder = build_embedder(config)?;
    let store = MemoryStore::open(
        &config.store.path,
        embedder,
        store_options(config, migrate_on_startup),
    )
    .await
    .with_context(|| format!("Failed to open store at {}", config.store.path.display()))?;
    store
        .initialize()
        .await
        .context("Failed to initialize store")?;
    Ok(store)
}

pub(crate) fn vector_options(
    search: &SearchConfig,
    limit: Option<usize>,
    memory_type: Option<String>,
    min_score: Option<f32>,
) -> VectorSearchOptions {
    VectorSearchOptions {
        limit: limit.unwrap_or(search.vector_limit),
        min_score: min_score.unwrap_or(search.vector_min_score),
        memory_type,
    }
}

pub(crate) fn keyword_options(
    search: &SearchConfig,
    limit: Option<usize>,
    memory_type: Option<String>,
) -> KeywordSearchOptions {
    KeywordSearchOptions {
        limit: limit.unwrap_or(search.keyword_limit),
        memory_type,
    }
}

pub(crate) fn hybrid_options(
    search: &SearchConfig,
    limit: Option<usize>,
    memory_type: Option<String>,
    min_score: Option<f32>,
) -> HybridSearchOptions {
    HybridSearchOptions {
        limit: limit.unwrap_or(search.hybrid_limit),
        min_score: min_score.unwrap_or(search.hybrid_min_score),
        memory_type,
        vector_weight: search.vector_weight,
        keyword_weight: search.keyword_weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_options_from_config() {
        let mut config = Config::default();
        config.store.full_text = false;
        config.search.overfetch_factor = 3;

        let options = store_options(&config, true);
        assert!(!options.full_text);
        assert_eq!(options.fusion.overfetch_factor, 3);
        assert_eq!(options.legacy_log_path, config.store.legacy_log_path);

        let options = store_options(&config, false);
        assert!(options.legacy_log_path.is_none());
    }

    #[test]
    fn test_search_options_fall_back_to_config() {
        let search = SearchConfig::default();
        let vector = vector_options(&search, None, None, None);
        assert_eq!(vector.limit, search.vector_limit);
        assert_eq!(vector.min_score, search.vector_min_score);

        let hybrid = hybrid_options(&search, Some(7), Some("fact".to_string()), Some(0.5));
        assert_eq!(hybrid.limit, 7);
        assert_eq!(hybrid.min_score, 0.5);
        assert_eq!(hybrid.memory_type.as_deref(), Some("fact"));
        assert_eq!(hybrid.vector_weight, search.vector_weight);

        let keyword = keyword_options(&search, None, None);
        assert_eq!(keyword.limit, search.keyword_limit);
    }

    #[test]
    fn test_openai_requires_key() {
        let mut config = Config::default();
        config.embedding.provider = EmbeddingProviderKind::OpenAi;
        config.embedding.api_key = None;
        assert!(build_embedder(&config).is_err());

        config.embedding.api_key = Some("sk-test".to_string());
        let embedder = build_embedder(&config).unwrap();
        assert_eq!(embedder.dimension(), config.store.embedding_dimension);
    }
}
