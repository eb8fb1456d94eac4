//! Database schema management.
//!
//! `memories` is the source of truth. `memories_fts` is an external-content
//! FTS5 index over `memories.content`, kept in step by triggers so that every
//! insert, delete and content update lands in the same transaction as the
//! row change.

use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use mnemos_protocols::{EngineCapabilities, OperationReport, DEFAULT_MEMORY_TYPE};

use crate::store::StoreOptions;

/// What `initialize` found and changed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaReport {
    pub capabilities: EngineCapabilities,
    pub journal_mode: String,
    /// The `memory_type` column was missing and has been added.
    pub type_column_added: bool,
    /// Rows whose `memory_type` was derived from existing metadata.
    pub backfilled_rows: usize,
    /// The full-text index was (re)built from existing rows.
    pub fts_rebuilt: bool,
    /// Outcome of the legacy log migration, when one was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy: Option<OperationReport>,
}

const MEMORIES_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS memories (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    embedding BLOB,
    metadata TEXT NOT NULL DEFAULT '{}',
    memory_type TEXT NOT NULL DEFAULT 'general',
    created_at INTEGER NOT NULL
);
"#;

const INDEX_SCHEMA: &str = r#"
CREATE INDEX IF NOT EXISTS idx_memories_type ON memories(memory_type);
CREATE INDEX IF NOT EXISTS idx_memories_created ON memories(created_at);
"#;

const FTS_SCHEMA: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS memories_fts USING fts5(
    content,
    content=memories,
    content_rowid=rowid,
    tokenize='porter unicode61'
);

CREATE TRIGGER IF NOT EXISTS memories_ai AFTER INSERT ON memories BEGIN
    INSERT INTO memories_fts(rowid, content) VALUES (new.rowid, new.content);
END;

CREATE TRIGGER IF NOT EXISTS memories_ad AFTER DELETE ON memories BEGIN
    INSERT INTO memories_fts(memories_fts, rowid, content) VALUES('delete', old.rowid, old.content);
END;

CREATE TRIGGER IF NOT EXISTS memories_au AFTER UPDATE OF content ON memories BEGIN
    INSERT INTO memories_fts(memories_fts, rowid, content) VALUES('delete', old.rowid, old.content);
    INSERT INTO memories_fts(rowid, content) VALUES (new.rowid, new.content);
END;
"#;

// Only string-valued, non-blank types are taken over; everything else keeps
// the column default. Mirrors `MemoryMetadata` deserialization.
const BACKFILL_TYPE: &str = r#"
UPDATE memories
SET memory_type = json_extract(metadata, '$.type')
WHERE json_valid(metadata)
  AND json_type(metadata, '$.type') = 'text'
  AND TRIM(json_extract(metadata, '$.type')) <> ''
"#;

/// Apply connection pragmas. Returns the journal mode actually in effect
/// (in-memory databases stay on `memory`).
pub(crate) fn apply_pragmas(conn: &Connection, options: &StoreOptions) -> rusqlite::Result<String> {
    let journal_mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "cache_size", -i64::from(options.cache_size_kib))?;
    conn.busy_timeout(Duration::from_millis(options.busy_timeout_ms))?;
    Ok(journal_mode)
}

/// Detect optional engine features.
///
/// `full_text_enabled = false` reports full-text search as absent even when
/// the engine has it.
pub(crate) fn probe_capabilities(conn: &Connection, full_text_enabled: bool) -> EngineCapabilities {
    let json = conn
        .query_row("SELECT json_extract('{\"probe\":1}', '$.probe')", [], |row| {
            row.get::<_, i64>(0)
        })
        .is_ok();

    let full_text = full_text_enabled
        && conn
            .execute_batch(
                "CREATE VIRTUAL TABLE temp.mnemos_fts_probe USING fts5(body);
                 DROP TABLE temp.mnemos_fts_probe;",
            )
            .is_ok();

    EngineCapabilities { json, full_text }
}

/// Create or upgrade the schema for the given capabilities.
pub(crate) fn init_schema(
    conn: &mut Connection,
    capabilities: EngineCapabilities,
) -> rusqlite::Result<SchemaReport> {
    let mut report = SchemaReport {
        capabilities,
        ..SchemaReport::default()
    };

    let tx = conn.transaction()?;
    tx.execute_batch(MEMORIES_SCHEMA)?;

    if !has_column(&tx, "memories", "memory_type")? {
        tx.execute(
            &format!(
                "ALTER TABLE memories ADD COLUMN memory_type TEXT NOT NULL DEFAULT '{}'",
                DEFAULT_MEMORY_TYPE
            ),
            [],
        )?;
        report.type_column_added = true;
        info!("Added memory_type column to existing memories table");

        if capabilities.json {
            report.backfilled_rows = tx.execute(BACKFILL_TYPE, [])?;
            info!("Backfilled memory_type for {} rows", report.backfilled_rows);
        } else {
            warn!("JSON functions unavailable; existing rows keep the default memory type");
        }
    }

    tx.execute_batch(INDEX_SCHEMA)?;

    if capabilities.full_text {
        let existed = table_exists(&tx, "memories_fts")?;
        tx.execute_batch(FTS_SCHEMA)?;
        if !existed {
            let rows: i64 = tx.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?;
            if rows > 0 {
                tx.execute("INSERT INTO memories_fts(memories_fts) VALUES('rebuild')", [])?;
                report.fts_rebuilt = true;
                info!("Built full-text index over {} existing rows", rows);
            }
        }
    }

    tx.commit()?;
    debug!("Schema ready: {:?}", report.capabilities);
    Ok(report)
}

pub(crate) fn has_column(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub(crate) fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}
