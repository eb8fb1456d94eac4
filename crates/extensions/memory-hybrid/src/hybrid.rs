//! Hybrid search: vector and keyword legs fused linearly.

use tracing::{debug, warn};

use mnemos_protocols::{HybridSearchOptions, MemoryError, SearchResult};

use crate::fts::escape_fts_query;
use crate::fusion::{linear_fusion, FusionWeights};
use crate::store::MemoryStore;

impl MemoryStore {
    /// Combine vector similarity and keyword relevance.
    ///
    /// Both legs run concurrently and over-fetch. Without a full-text index
    /// the keyword leg is empty and results rest on the vector score alone.
    pub async fn hybrid_search(
        &self,
        query: &str,
        options: &HybridSearchOptions,
    ) -> Result<Vec<SearchResult>, MemoryError> {
        let capabilities = self.ensure_initialized()?;
        if options.limit == 0 {
            return Ok(Vec::new());
        }

        let fusion = &self.options.fusion;
        let fetch = options.limit.saturating_mul(fusion.overfetch_factor.max(1));
        let query_vector = self.embedder.generate(query).await;
        let fts_query = escape_fts_query(query);

        let vector_leg = self.vector_leg(
            query_vector,
            fetch,
            fusion.vector_leg_min_score,
            options.memory_type.clone(),
        );
        let keyword_leg = async {
            if !capabilities.full_text || fts_query.is_empty() {
                return Ok(Vec::new());
            }
            self.keyword_leg(fts_query.clone(), fetch, options.memory_type.clone())
                .await
        };

        let (vector_results, keyword_results) = tokio::join!(vector_leg, keyword_leg);
        let vector_results = vector_results.unwrap_or_else(|e| {
            warn!("Hybrid vector leg failed: {}", e);
            Vec::new()
        });
        let keyword_results = keyword_results.unwrap_or_else(|e| {
            warn!("Hybrid keyword leg failed: {}", e);
            Vec::new()
        });
        debug!(
            "Hybrid legs: {} vector, {} keyword candidates",
            vector_results.len(),
            keyword_results.len()
        );

        Ok(linear_fusion(
            vector_results,
            keyword_results,
            FusionWeights {
                vector: options.vector_weight,
                keyword: options.keyword_weight,
            },
            options.min_score,
            options.limit,
        ))
    }
}
