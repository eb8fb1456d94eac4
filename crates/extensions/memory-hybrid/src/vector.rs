//! Vector similarity search.

use rusqlite::{params, OptionalExtension};
use tracing::{debug, warn};

use mnemos_memory_vector::{codec, VectorRanker};
use mnemos_protocols::{MemoryError, SearchResult, VectorSearchOptions};

use crate::store::{created_at_from_sql, map_db_error, metadata_from_sql, MemoryStore};

impl MemoryStore {
    /// Rank stored memories by cosine similarity to `query`.
    ///
    /// Engine failures are logged and reported as no results.
    pub async fn search_memories(
        &self,
        query: &str,
        options: &VectorSearchOptions,
    ) -> Result<Vec<SearchResult>, MemoryError> {
        self.ensure_initialized()?;
        if options.limit == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.generate(query).await;
        match self
            .vector_leg(
                query_vector,
                options.limit,
                options.min_score,
                options.memory_type.clone(),
            )
            .await
        {
            Ok(results) => Ok(results),
            Err(e) => {
                warn!("Vector search failed: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Exhaustive scan shared by vector and hybrid search.
    ///
    /// Only id, embedding and ordering keys are read during the scan;
    /// content and metadata are loaded for the surviving hits.
    pub(crate) async fn vector_leg(
        &self,
        query_vector: Vec<f32>,
        limit: usize,
        min_score: f32,
        memory_type: Option<String>,
    ) -> Result<Vec<SearchResult>, MemoryError> {
        self.conn
            .call(move |conn| {
                let mut ranker = VectorRanker::new(query_vector, min_score, limit);
                let mut undecodable = 0usize;

                let sql = match memory_type {
                    Some(_) => {
                        "SELECT rowid, embedding, created_at FROM memories
                         WHERE embedding IS NOT NULL AND memory_type = ?1"
                    }
                    None => "SELECT rowid, embedding, created_at FROM memories WHERE embedding IS NOT NULL",
                };
                let mut stmt = conn.prepare(sql)?;
                let mut rows = match &memory_type {
                    Some(t) => stmt.query(params![t])?,
                    None => stmt.query([])?,
                };

                while let Some(row) = rows.next()? {
                    let rowid: i64 = row.get(0)?;
                    let blob: Vec<u8> = row.get(1)?;
                    let Ok(vector) = codec::decode(&blob) else {
                        undecodable += 1;
                        continue;
                    };
                    let recency = created_at_from_sql(row.get_ref(2)?).timestamp_millis();
                    ranker.consider(rowid, &vector, recency, rowid);
                }
                drop(rows);

                if ranker.mismatched() > 0 || undecodable > 0 {
                    warn!(
                        "Vector scan: {} undecodable embeddings skipped, {} with mismatched dimensionality",
                        undecodable,
                        ranker.mismatched()
                    );
                }
                let scanned = ranker.scanned();
                let hits = ranker.finish();
                debug!("Vector scan: {} candidates, {} hits", scanned, hits.len());

                let mut fetch = conn.prepare(
                    "SELECT id, content, metadata, created_at FROM memories WHERE rowid = ?1",
                )?;
                let mut results = Vec::with_capacity(hits.len());
                for hit in hits {
                    let found = fetch
                        .query_row(params![hit.item], |row| {
                            Ok(SearchResult {
                                id: row.get(0)?,
                                content: row.get(1)?,
                                metadata: metadata_from_sql(row.get(2)?),
                                score: hit.score,
                                timestamp: created_at_from_sql(row.get_ref(3)?),
                                vector_score: None,
                                keyword_score: None,
                            })
                        })
                        .optional()?;
                    results.extend(found);
                }
                Ok(results)
            })
            .await
            .map_err(map_db_error)
    }
}

#[cfg(test)]
#[path = "vector_tests.rs"]
mod tests;
