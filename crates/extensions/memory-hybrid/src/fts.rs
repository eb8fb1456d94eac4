//! SQLite FTS5 keyword search.

use rusqlite::params;
use tracing::{debug, warn};

use mnemos_protocols::{KeywordSearchOptions, MemoryError, SearchResult};

use crate::store::{created_at_from_sql, map_db_error, metadata_from_sql, MemoryStore};

impl MemoryStore {
    /// Rank memories by BM25 relevance to the words of `query`.
    ///
    /// Scores are non-negative, higher is better. Returns no results when the
    /// full-text index is unavailable or the engine reports an error.
    pub async fn keyword_search(
        &self,
        query: &str,
        options: &KeywordSearchOptions,
    ) -> Result<Vec<SearchResult>, MemoryError> {
        let capabilities = self.ensure_initialized()?;
        if !capabilities.full_text {
            debug!("Keyword search skipped: full-text index unavailable");
            return Ok(Vec::new());
        }
        if options.limit == 0 {
            return Ok(Vec::new());
        }

        let fts_query = escape_fts_query(query);
        if fts_query.is_empty() {
            return Ok(Vec::new());
        }

        match self
            .keyword_leg(fts_query, options.limit, options.memory_type.clone())
            .await
        {
            Ok(results) => Ok(results),
            Err(e) => {
                warn!("Keyword search failed: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Raw FTS query, `fts_query` must already be escaped.
    pub(crate) async fn keyword_leg(
        &self,
        fts_query: String,
        limit: usize,
        memory_type: Option<String>,
    ) -> Result<Vec<SearchResult>, MemoryError> {
        self.conn
            .call(move |conn| {
                let type_clause = if memory_type.is_some() {
                    "AND m.memory_type = ?3"
                } else {
                    ""
                };
                let sql = format!(
                    r#"
                    SELECT m.id, m.content, m.metadata, m.created_at, bm25(memories_fts) AS relevance
                    FROM memories_fts
                    JOIN memories m ON m.rowid = memories_fts.rowid
                    WHERE memories_fts MATCH ?1 {}
                    ORDER BY relevance ASC, m.created_at DESC, m.rowid DESC
                    LIMIT ?2
                    "#,
                    type_clause
                );

                let mut stmt = conn.prepare(&sql)?;
                let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<SearchResult> {
                    let relevance: f64 = row.get(4)?;
                    Ok(SearchResult {
                        id: row.get(0)?,
                        content: row.get(1)?,
                        metadata: metadata_from_sql(row.get(2)?),
                        // bm25() is negative, more negative is more relevant.
                        score: (-relevance).max(0.0) as f32,
                        timestamp: created_at_from_sql(row.get_ref(3)?),
                        vector_score: None,
                        keyword_score: None,
                    })
                };

                let limit = i64::try_from(limit).unwrap_or(i64::MAX);
                let rows = match &memory_type {
                    Some(t) => stmt.query_map(params![fts_query, limit, t], map_row)?,
                    None => stmt.query_map(params![fts_query, limit], map_row)?,
                };
                let results = rows.collect::<rusqlite::Result<Vec<_>>>()?;
                debug!("Keyword search matched {} memories", results.len());
                Ok(results)
            })
            .await
            .map_err(map_db_error)
    }
}

/// Turn free text into an FTS5 query: each word becomes a quoted phrase and
/// the phrases are OR-ed together. Words without any letter or digit are
/// dropped, so operator characters never reach the query parser.
pub fn escape_fts_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|w| w.replace('"', ""))
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .map(|w| format!("\"{}\"", w))
        .collect::<Vec<_>>()
        .join(" OR ")
}

#[cfg(test)]
#[path = "fts_tests.rs"]
mod tests;
