//! Score fusion for hybrid search.

use std::cmp::Ordering;
use std::collections::HashMap;

use mnemos_protocols::SearchResult;

/// How hybrid search gathers candidates before fusing them.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionConfig {
    /// Each leg fetches `limit * overfetch_factor` candidates.
    pub overfetch_factor: usize,
    /// Similarity floor for the vector leg, below the fused threshold so
    /// records carried by their keyword score still have a vector score.
    pub vector_leg_min_score: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            overfetch_factor: 2,
            vector_leg_min_score: 0.1,
        }
    }
}

/// Linear combination weights. They need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub vector: f32,
    pub keyword: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            vector: 0.6,
            keyword: 0.4,
        }
    }
}

struct Candidate {
    result: SearchResult,
    vector: f32,
    keyword: f32,
}

/// Fuse one batch of vector hits with one batch of keyword hits.
///
/// Keyword scores are divided by the largest keyword score in this batch,
/// with the denominator floored at 1. A record present in only one leg
/// scores 0 for the other. Results below `min_score` are dropped; the rest
/// are ordered by combined score, then most recent. Remaining ties keep the
/// order in which the legs returned them.
pub fn linear_fusion(
    vector_results: Vec<SearchResult>,
    keyword_results: Vec<SearchResult>,
    weights: FusionWeights,
    min_score: f32,
    limit: usize,
) -> Vec<SearchResult> {
    let max_keyword = keyword_results
        .iter()
        .map(|r| r.score)
        .fold(0.0f32, f32::max);
    let denominator = max_keyword.max(1.0);

    // Insertion order (vector rank, then keyword-only rank) breaks exact ties.
    let mut candidates: Vec<Candidate> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for result in vector_results {
        let score = result.score;
        match positions.get(&result.id) {
            Some(&i) => candidates[i].vector = candidates[i].vector.max(score),
            None => {
                positions.insert(result.id.clone(), candidates.len());
                candidates.push(Candidate {
                    result,
                    vector: score,
                    keyword: 0.0,
                });
            }
        }
    }

    for result in keyword_results {
        let normalized = result.score / denominator;
        match positions.get(&result.id) {
            Some(&i) => candidates[i].keyword = candidates[i].keyword.max(normalized),
            None => {
                positions.insert(result.id.clone(), candidates.len());
                candidates.push(Candidate {
                    result,
                    vector: 0.0,
                    keyword: normalized,
                });
            }
        }
    }

    let mut fused: Vec<SearchResult> = candidates
        .into_iter()
        .filter_map(|c| {
            let combined = c.vector * weights.vector + c.keyword * weights.keyword;
            if combined < min_score || combined.is_nan() {
                return None;
            }
            Some(SearchResult {
                score: combined,
                vector_score: Some(c.vector),
                keyword_score: Some(c.keyword),
                ..c.result
            })
        })
        .collect();

    fused.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });
    fused.truncate(limit);
    fused
}

#[cfg(test)]
#[path = "fusion_tests.rs"]
mod tests;
