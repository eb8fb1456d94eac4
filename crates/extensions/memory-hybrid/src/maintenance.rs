//! Administrative operations: delete, clear, listing, statistics,
//! export/import and re-embedding.

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::params;
use serde_json::Value;
use tracing::{debug, info, warn};

use mnemos_memory_vector::codec;
use mnemos_protocols::{MemoryError, MemoryRecord, MemoryStats, OperationReport};

use crate::store::{
    created_at_from_sql, map_db_error, record_from_row, InsertRow, MemoryStore, RECORD_COLUMNS,
};

/// Rows re-embedded per write transaction.
const REEMBED_BATCH: usize = 64;

impl MemoryStore {
    /// Delete one memory. Returns `false` when no such id exists.
    pub async fn delete_memory(&self, id: &str) -> Result<bool, MemoryError> {
        self.ensure_initialized()?;
        let id = id.to_string();
        let deleted = self
            .conn
            .call(move |conn| Ok(conn.execute("DELETE FROM memories WHERE id = ?1", params![id])?))
            .await
            .map_err(map_db_error)?;
        Ok(deleted > 0)
    }

    /// Delete every memory. Returns the number removed.
    pub async fn clear_all_memories(&self) -> Result<usize, MemoryError> {
        self.ensure_initialized()?;
        let removed = self
            .conn
            .call(|conn| {
                let tx = conn.transaction()?;
                let removed = tx.execute("DELETE FROM memories", [])?;
                tx.commit()?;
                Ok(removed)
            })
            .await
            .map_err(map_db_error)?;
        info!("Cleared {} memories", removed);
        Ok(removed)
    }

    /// All memories of one type, newest first.
    pub async fn get_memories_by_type(
        &self,
        memory_type: &str,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        self.ensure_initialized()?;
        let memory_type = memory_type.to_string();
        self.conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT {} FROM memories WHERE memory_type = ?1
                     ORDER BY created_at DESC, rowid DESC",
                    RECORD_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let records = stmt
                    .query_map(params![memory_type], record_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(records)
            })
            .await
            .map_err(map_db_error)
    }

    /// Counts per type, embedding coverage and time range.
    pub async fn get_memory_stats(&self) -> Result<MemoryStats, MemoryError> {
        let capabilities = self.ensure_initialized()?;
        self.conn
            .call(move |conn| {
                let (total, with_embedding): (i64, i64) = conn.query_row(
                    "SELECT COUNT(*), COUNT(embedding) FROM memories",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;

                let mut by_type = BTreeMap::new();
                let mut stmt = conn.prepare(
                    "SELECT memory_type, COUNT(*) FROM memories GROUP BY memory_type",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?;
                for row in rows {
                    let (memory_type, count) = row?;
                    by_type.insert(memory_type, count.max(0) as u64);
                }

                let (oldest, newest) = if total > 0 {
                    conn.query_row(
                        "SELECT MIN(created_at), MAX(created_at) FROM memories",
                        [],
                        |row| {
                            Ok((
                                Some(created_at_from_sql(row.get_ref(0)?)),
                                Some(created_at_from_sql(row.get_ref(1)?)),
                            ))
                        },
                    )?
                } else {
                    (None, None)
                };

                Ok(MemoryStats {
                    total: total.max(0) as u64,
                    with_embedding: with_embedding.max(0) as u64,
                    by_type,
                    oldest,
                    newest,
                    capabilities,
                })
            })
            .await
            .map_err(map_db_error)
    }

    /// Every memory with its embedding, oldest first.
    pub async fn export_memories(&self) -> Result<Vec<MemoryRecord>, MemoryError> {
        self.ensure_initialized()?;
        self.conn
            .call(|conn| {
                let sql = format!(
                    "SELECT {} FROM memories ORDER BY created_at ASC, rowid ASC",
                    RECORD_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let records = stmt
                    .query_map([], record_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(records)
            })
            .await
            .map_err(map_db_error)
    }

    /// Write or overwrite records by id in one transaction.
    ///
    /// Records with empty content fail individually. Embeddings whose
    /// dimensionality differs from the store's are dropped with a warning
    /// and the record is kept.
    pub async fn import_memories(
        &self,
        records: Vec<MemoryRecord>,
    ) -> Result<OperationReport, MemoryError> {
        self.ensure_initialized()?;
        let dimension = self.embedding_dimension();

        let mut report = OperationReport::default();
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            match prepare_import(record, dimension) {
                Ok(row) => rows.push(row),
                Err((item, message)) => report.record_failure(item, message),
            }
        }

        let report = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                for row in &rows {
                    match row.upsert(&tx) {
                        Ok(()) => report.record_success(),
                        Err(e) => report.record_failure(row.id.clone(), e.to_string()),
                    }
                }
                tx.commit()?;
                Ok(report)
            })
            .await
            .map_err(map_db_error)?;

        info!(
            "Imported {} memories ({} failed)",
            report.succeeded, report.failed
        );
        Ok(report)
    }

    /// Export every memory to a JSON array file.
    ///
    /// The file is written beside the target and renamed into place.
    pub async fn export_to_file(&self, path: impl AsRef<Path>) -> Result<usize, MemoryError> {
        let path = path.as_ref();
        let records = self.export_memories().await?;
        let bytes = serde_json::to_vec_pretty(&records)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let staging = path.with_extension("export.tmp");
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, path).await?;

        info!("Exported {} memories to {}", records.len(), path.display());
        Ok(records.len())
    }

    /// Import a JSON array file produced by [`export_to_file`](Self::export_to_file).
    ///
    /// Entries that do not decode as records are reported individually.
    pub async fn import_from_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<OperationReport, MemoryError> {
        self.ensure_initialized()?;
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await?;
        let entries: Vec<Value> = serde_json::from_str(&text)?;

        let mut decode_failures = OperationReport::default();
        let mut records = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<MemoryRecord>(entry) {
                Ok(record) => records.push(record),
                Err(e) => decode_failures.record_failure(format!("entry {}", index), e.to_string()),
            }
        }

        let mut report = self.import_memories(records).await?;
        report.failed += decode_failures.failed;
        report.failures.extend(decode_failures.failures);
        debug!("Imported {} from {}", report.succeeded, path.display());
        Ok(report)
    }

    /// Generate embeddings for memories that have none, or whose stored
    /// embedding does not match the current dimensionality.
    pub async fn reembed_missing(&self) -> Result<OperationReport, MemoryError> {
        self.ensure_initialized()?;
        let expected_bytes = i64::try_from(self.embedding_dimension() * 4).unwrap_or(i64::MAX);

        let pending: Vec<(String, String)> = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, content FROM memories
                     WHERE embedding IS NULL OR length(embedding) <> ?1
                     ORDER BY created_at ASC, rowid ASC",
                )?;
                let rows = stmt
                    .query_map(params![expected_bytes], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_db_error)?;

        let mut report = OperationReport::default();
        if pending.is_empty() {
            return Ok(report);
        }
        info!("Re-embedding {} memories", pending.len());

        for batch in pending.chunks(REEMBED_BATCH) {
            let mut updates = Vec::with_capacity(batch.len());
            for (id, content) in batch {
                let vector = self.embedder.generate(content).await;
                updates.push((id.clone(), codec::encode(&vector)));
            }

            let outcome = self
                .conn
                .call(move |conn| {
                    let tx = conn.transaction()?;
                    let mut outcome = Vec::with_capacity(updates.len());
                    for (id, blob) in &updates {
                        let changed = tx.execute(
                            "UPDATE memories SET embedding = ?1 WHERE id = ?2",
                            params![blob, id],
                        )?;
                        outcome.push((id.clone(), changed > 0));
                    }
                    tx.commit()?;
                    Ok(outcome)
                })
                .await
                .map_err(map_db_error)?;

            for (id, updated) in outcome {
                if updated {
                    report.record_success();
                } else {
                    // Deleted between selection and update.
                    debug!("Memory {} vanished before re-embedding", id);
                    report.record_skip();
                }
            }
        }

        Ok(report)
    }
}

fn prepare_import(record: MemoryRecord, dimension: usize) -> Result<InsertRow, (String, String)> {
    if record.id.trim().is_empty() {
        return Err((record.id, "id must not be empty".to_string()));
    }
    if record.content.trim().is_empty() {
        return Err((record.id, "content must not be empty".to_string()));
    }

    let embedding = match record.embedding {
        Some(vector) if vector.len() == dimension => Some(codec::encode(&vector)),
        Some(vector) => {
            warn!(
                "Dropping {}-dimensional embedding of {} (store uses {})",
                vector.len(),
                record.id,
                dimension
            );
            None
        }
        None => None,
    };

    let metadata = serde_json::to_string(&record.metadata)
        .map_err(|e| (record.id.clone(), e.to_string()))?;

    Ok(InsertRow {
        memory_type: record.metadata.memory_type.clone(),
        created_at_ms: record.created_at.timestamp_millis(),
        id: record.id,
        content: record.content,
        embedding,
        metadata,
    })
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
