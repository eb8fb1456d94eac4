//! Search defaults.

use serde::{Deserialize, Serialize};

/// Default limits, thresholds and fusion weights for the three search modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_vector_limit")]
    pub vector_limit: usize,

    #[serde(default = "default_vector_min_score")]
    pub vector_min_score: f32,

    #[serde(default = "default_keyword_limit")]
    pub keyword_limit: usize,

    #[serde(default = "default_hybrid_limit")]
    pub hybrid_limit: usize,

    #[serde(default = "default_hybrid_min_score")]
    pub hybrid_min_score: f32,

    #[serde(default = "default_vector_weight")]
    pub vector_weight: f32,

    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f32,

    /// Each hybrid leg fetches `limit * overfetch_factor` candidates.
    #[serde(default = "default_overfetch_factor")]
    pub overfetch_factor: usize,

    /// Similarity floor for the vector leg of hybrid search.
    #[serde(default = "default_hybrid_vector_min_score")]
    pub hybrid_vector_min_score: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            vector_limit: default_vector_limit(),
            vector_min_score: default_vector_min_score(),
            keyword_limit: default_keyword_limit(),
            hybrid_limit: default_hybrid_limit(),
            hybrid_min_score: default_hybrid_min_score(),
            vector_weight: default_vector_weight(),
            keyword_weight: default_keyword_weight(),
            overfetch_factor: default_overfetch_factor(),
            hybrid_vector_min_score: default_hybrid_vector_min_score(),
        }
    }
}

fn default_vector_limit() -> usize {
    5
}

fn default_vector_min_score() -> f32 {
    0.3
}

fn default_keyword_limit() -> usize {
    10
}

fn default_hybrid_limit() -> usize {
    5
}

fn default_hybrid_min_score() -> f32 {
    0.2
}

fn default_vector_weight() -> f32 {
    0.6
}

fn default_keyword_weight() -> f32 {
    0.4
}

fn default_overfetch_factor() -> usize {
    2
}

fn default_hybrid_vector_min_score() -> f32 {
    0.1
}
