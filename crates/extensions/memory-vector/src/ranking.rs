//! Linear-scan ranking.
//!
//! Every candidate is scored against the query; there is no approximate index.
//! Ordering is score descending, then most recent first, then latest insert
//! first, so a fixed corpus always yields the same sequence.

use std::cmp::Ordering;

use crate::similarity::cosine_similarity;

/// A candidate that passed the score threshold.
#[derive(Debug, Clone)]
pub struct RankedHit<T> {
    pub item: T,
    pub score: f32,
    /// Creation time in epoch milliseconds.
    pub recency: i64,
    /// Insertion sequence (row id) for ties within the same millisecond.
    pub sequence: i64,
}

/// Total order used for every ranked result list.
pub fn compare_ranked(
    (a_score, a_recency, a_sequence): (f32, i64, i64),
    (b_score, b_recency, b_sequence): (f32, i64, i64),
) -> Ordering {
    b_score
        .partial_cmp(&a_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b_recency.cmp(&a_recency))
        .then_with(|| b_sequence.cmp(&a_sequence))
}

impl<T> RankedHit<T> {
    fn key(&self) -> (f32, i64, i64) {
        (self.score, self.recency, self.sequence)
    }
}

/// Accumulates scored candidates during a scan and keeps the best `limit`.
pub struct VectorRanker<T> {
    query: Vec<f32>,
    min_score: f32,
    limit: usize,
    hits: Vec<RankedHit<T>>,
    scanned: usize,
    mismatched: usize,
}

impl<T> VectorRanker<T> {
    pub fn new(query: Vec<f32>, min_score: f32, limit: usize) -> Self {
        Self {
            query,
            min_score,
            limit,
            hits: Vec::new(),
            scanned: 0,
            mismatched: 0,
        }
    }

    /// Score one candidate. Returns the score when it was kept.
    pub fn consider(&mut self, item: T, embedding: &[f32], recency: i64, sequence: i64) -> Option<f32> {
        self.scanned += 1;
        if embedding.len() != self.query.len() {
            self.mismatched += 1;
        }

        let score = cosine_similarity(&self.query, embedding);
        if score < self.min_score {
            return None;
        }

        self.hits.push(RankedHit {
            item,
            score,
            recency,
            sequence,
        });
        if self.hits.len() >= self.compaction_threshold() {
            self.compact();
        }
        Some(score)
    }

    /// Number of candidates scored so far.
    pub fn scanned(&self) -> usize {
        self.scanned
    }

    /// Candidates whose dimensionality differed from the query.
    pub fn mismatched(&self) -> usize {
        self.mismatched
    }

    /// Sorted, truncated hits.
    pub fn finish(mut self) -> Vec<RankedHit<T>> {
        self.compact();
        self.hits
    }

    fn compaction_threshold(&self) -> usize {
        self.limit.saturating_mul(4).saturating_add(64)
    }

    fn compact(&mut self) {
        self.hits.sort_by(|a, b| compare_ranked(a.key(), b.key()));
        self.hits.truncate(self.limit);
    }
}
