//! Import of the legacy JSON-lines memory log.
//!
//! Each line of the log is one object:
//! `{"id"?, "content", "embedding"?, "metadata"?, "created_at"?}`.
//! Embeddings may be plain arrays or index-keyed objects, and timestamps
//! come in several shapes, so every field is decoded leniently.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use mnemos_memory_vector::codec;
use mnemos_protocols::{timestamp, MemoryError, MemoryMetadata, OperationReport};

use crate::store::{content_id, map_db_error, InsertRow, MemoryStore};

#[derive(Debug, Deserialize)]
struct LegacyRecord {
    #[serde(default)]
    id: Option<String>,
    content: String,
    #[serde(default)]
    embedding: Option<Value>,
    #[serde(default)]
    metadata: Option<Value>,
    #[serde(default)]
    created_at: Option<Value>,
}

impl MemoryStore {
    /// Insert every parseable line of a legacy log, ignoring ids that
    /// already exist. Safe to repeat.
    pub async fn import_legacy_log(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<OperationReport, MemoryError> {
        self.ensure_initialized()?;
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let dimension = self.embedding_dimension();

        let mut report = OperationReport::default();
        let mut rows = Vec::new();
        // Decoded per line: one undecodable line must not sink the rest.
        for (index, raw) in bytes.split(|&b| b == b'\n').enumerate() {
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            let line = match std::str::from_utf8(raw) {
                Ok(line) => line,
                Err(e) => {
                    debug!("Legacy line {} is not UTF-8: {}", index + 1, e);
                    report.record_failure(format!("line {}", index + 1), e.to_string());
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_legacy_line(line, dimension) {
                Ok(row) => rows.push(row),
                Err(message) => {
                    debug!("Legacy line {} rejected: {}", index + 1, message);
                    report.record_failure(format!("line {}", index + 1), message);
                }
            }
        }

        let report = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                for row in &rows {
                    match row.insert_or_ignore(&tx) {
                        Ok(true) => report.record_success(),
                        Ok(false) => report.record_skip(),
                        Err(e) => report.record_failure(row.id.clone(), e.to_string()),
                    }
                }
                tx.commit()?;
                Ok(report)
            })
            .await
            .map_err(map_db_error)?;

        info!(
            "Legacy import from {}: {} imported, {} already present, {} failed",
            path.display(),
            report.succeeded,
            report.skipped,
            report.failed
        );
        Ok(report)
    }

    /// Import a legacy log and, when at least one record was imported,
    /// rename it out of the way with a timestamp suffix.
    ///
    /// A missing file is not an error and yields an empty report.
    pub async fn migrate_legacy_log(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<OperationReport, MemoryError> {
        self.ensure_initialized()?;
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            debug!("No legacy log at {}", path.display());
            return Ok(OperationReport::default());
        }

        let report = self.import_legacy_log(path).await?;
        if report.succeeded > 0 {
            let archived = archived_path(path);
            match tokio::fs::rename(path, &archived).await {
                Ok(()) => info!("Legacy log archived as {}", archived.display()),
                Err(e) => warn!("Could not archive legacy log {}: {}", path.display(), e),
            }
        }
        Ok(report)
    }
}

/// Decode one log line into a row. Lines without an id get one derived from
/// their content so that repeated imports stay idempotent.
fn parse_legacy_line(line: &str, dimension: usize) -> Result<InsertRow, String> {
    let record: LegacyRecord = serde_json::from_str(line).map_err(|e| e.to_string())?;
    if record.content.trim().is_empty() {
        return Err("content must not be empty".to_string());
    }

    let id = record
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| content_id(&record.content));

    let embedding = match record.embedding {
        None | Some(Value::Null) => None,
        Some(value) => {
            let vector = codec::vector_from_json(&value).map_err(|e| e.to_string())?;
            if vector.len() == dimension {
                Some(codec::encode(&vector))
            } else {
                warn!(
                    "Dropping {}-dimensional legacy embedding of {} (store uses {})",
                    vector.len(),
                    id,
                    dimension
                );
                None
            }
        }
    };

    let metadata = match record.metadata {
        Some(Value::String(text)) => MemoryMetadata::from_json_str(&text),
        Some(value) => MemoryMetadata::from_json(value),
        None => MemoryMetadata::default(),
    };

    let created_at = record
        .created_at
        .as_ref()
        .and_then(timestamp::from_value)
        .or(metadata.timestamp)
        .unwrap_or_else(Utc::now);

    Ok(InsertRow {
        id,
        content: record.content,
        embedding,
        memory_type: metadata.memory_type.clone(),
        metadata: serde_json::to_string(&metadata).map_err(|e| e.to_string())?,
        created_at_ms: created_at.timestamp_millis(),
    })
}

fn archived_path(path: &Path) -> PathBuf {
    let suffix = Utc::now().format("%Y%m%dT%H%M%S%3f");
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "memories.jsonl".to_string());
    path.with_file_name(format!("{}.migrated-{}", name, suffix))
}

#[cfg(test)]
#[path = "migration_tests.rs"]
mod tests;
