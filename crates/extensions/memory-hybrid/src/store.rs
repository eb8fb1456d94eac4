//! The memory store handle.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rusqlite::types::ValueRef;
use rusqlite::{params, OptionalExtension, Row};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio_rusqlite::Connection;
use tracing::{debug, info, warn};

use mnemos_memory_vector::{codec, FallbackEmbedder};
use mnemos_protocols::{
    timestamp, AddedMemory, EngineCapabilities, MemoryError, MemoryMetadata, MemoryRecord,
};

use crate::fusion::FusionConfig;
use crate::schema::{self, SchemaReport};

/// Length of generated memory ids (hex characters).
const ID_LENGTH: usize = 16;

/// Columns read by [`record_from_row`], in order.
pub(crate) const RECORD_COLUMNS: &str = "id, content, embedding, metadata, created_at";

/// Engine tuning for a store.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Maintain the FTS5 index when the engine supports it.
    pub full_text: bool,
    pub cache_size_kib: u32,
    pub busy_timeout_ms: u64,
    /// Legacy JSON-lines log imported by `initialize` when present.
    pub legacy_log_path: Option<PathBuf>,
    pub fusion: FusionConfig,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            full_text: true,
            cache_size_kib: 8192,
            busy_timeout_ms: 5000,
            legacy_log_path: None,
            fusion: FusionConfig::default(),
        }
    }
}

/// Hybrid semantic memory store backed by one SQLite file.
///
/// Every operation other than `initialize` and `close` fails with
/// [`MemoryError::NotInitialized`] until `initialize` has succeeded.
pub struct MemoryStore {
    pub(crate) conn: Connection,
    pub(crate) embedder: FallbackEmbedder,
    pub(crate) options: StoreOptions,
    capabilities: RwLock<Option<EngineCapabilities>>,
    last_created_at: AtomicI64,
}

impl MemoryStore {
    /// Open (or create) the database file. Parent directories are created.
    pub async fn open(
        path: impl AsRef<Path>,
        embedder: FallbackEmbedder,
        options: StoreOptions,
    ) -> Result<Self, MemoryError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let conn = Connection::open(&path)
            .await
            .map_err(|e| MemoryError::ConnectionError(e.to_string()))?;
        debug!("Opened memory store at {}", path.display());
        Ok(Self::with_connection(conn, embedder, options))
    }

    /// Open a private in-memory database.
    pub async fn open_in_memory(
        embedder: FallbackEmbedder,
        options: StoreOptions,
    ) -> Result<Self, MemoryError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| MemoryError::ConnectionError(e.to_string()))?;
        Ok(Self::with_connection(conn, embedder, options))
    }

    fn with_connection(conn: Connection, embedder: FallbackEmbedder, options: StoreOptions) -> Self {
        Self {
            conn,
            embedder,
            options,
            capabilities: RwLock::new(None),
            last_created_at: AtomicI64::new(0),
        }
    }

    /// Apply pragmas, detect capabilities, create or upgrade the schema and
    /// migrate the legacy log if one is configured and present.
    ///
    /// Safe to call more than once.
    pub async fn initialize(&self) -> Result<SchemaReport, MemoryError> {
        let options = self.options.clone();
        let (mut report, newest) = self
            .conn
            .call(move |conn| {
                let journal_mode = schema::apply_pragmas(conn, &options)?;
                let capabilities = schema::probe_capabilities(conn, options.full_text);
                let mut report = schema::init_schema(conn, capabilities)?;
                report.journal_mode = journal_mode;

                let newest: Option<i64> = conn.query_row(
                    "SELECT MAX(created_at) FROM memories WHERE typeof(created_at) = 'integer'",
                    [],
                    |row| row.get(0),
                )?;
                Ok((report, newest))
            })
            .await
            .map_err(map_db_error)?;

        if !report.capabilities.json {
            warn!("JSON functions unavailable; type backfill disabled");
        }
        if !report.capabilities.full_text {
            warn!("Full-text search unavailable; keyword search returns no results");
        }

        self.last_created_at
            .fetch_max(newest.unwrap_or(0), Ordering::SeqCst);
        *self.capabilities.write() = Some(report.capabilities);
        info!(
            "Memory store initialized (journal_mode={}, json={}, full_text={})",
            report.journal_mode, report.capabilities.json, report.capabilities.full_text
        );

        if let Some(path) = self.options.legacy_log_path.clone() {
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                match self.migrate_legacy_log(&path).await {
                    Ok(legacy) => report.legacy = Some(legacy),
                    Err(e) => warn!("Legacy log migration failed for {}: {}", path.display(), e),
                }
            }
        }

        Ok(report)
    }

    /// Close the underlying connection.
    pub async fn close(self) -> Result<(), MemoryError> {
        self.conn
            .close()
            .await
            .map_err(|e| MemoryError::ConnectionError(e.to_string()))
    }

    /// Capabilities detected by `initialize`.
    pub fn capabilities(&self) -> Option<EngineCapabilities> {
        *self.capabilities.read()
    }

    pub fn embedding_dimension(&self) -> usize {
        self.embedder.dimension()
    }

    pub(crate) fn ensure_initialized(&self) -> Result<EngineCapabilities, MemoryError> {
        self.capabilities().ok_or(MemoryError::NotInitialized)
    }

    /// Store a new memory.
    ///
    /// The embedding is generated here and never fails (the hash embedder
    /// stands in for an unavailable provider). `metadata.timestamp` is set to
    /// the creation time unless the caller supplied one.
    pub async fn add_memory(
        &self,
        content: &str,
        metadata: MemoryMetadata,
    ) -> Result<AddedMemory, MemoryError> {
        self.ensure_initialized()?;
        if content.trim().is_empty() {
            return Err(MemoryError::InvalidInput("content must not be empty".to_string()));
        }

        let created_at_ms = self.next_created_at();
        let created_at = timestamp::from_millis(created_at_ms).unwrap_or_else(Utc::now);
        let mut metadata = metadata;
        metadata.timestamp.get_or_insert(created_at);

        let embedding = self.embedder.generate(content).await;
        let id = generate_id(content);
        let row = InsertRow {
            id: id.clone(),
            content: content.to_string(),
            embedding: Some(codec::encode(&embedding)),
            memory_type: metadata.memory_type.clone(),
            metadata: serde_json::to_string(&metadata)?,
            created_at_ms,
        };

        let inserted = self
            .conn
            .call(move |conn| Ok(row.insert_or_ignore(conn)?))
            .await
            .map_err(map_db_error)?;

        if inserted {
            debug!("Stored memory {}", id);
        } else {
            warn!("Memory id collision, insert ignored: {}", id);
        }
        Ok(AddedMemory { id, inserted })
    }

    /// Fetch one memory by id.
    pub async fn get_memory(&self, id: &str) -> Result<Option<MemoryRecord>, MemoryError> {
        self.ensure_initialized()?;
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                let sql = format!("SELECT {} FROM memories WHERE id = ?1", RECORD_COLUMNS);
                Ok(conn.query_row(&sql, params![id], record_from_row).optional()?)
            })
            .await
            .map_err(map_db_error)
    }

    /// Number of stored memories.
    pub async fn count(&self) -> Result<u64, MemoryError> {
        self.ensure_initialized()?;
        self.conn
            .call(|conn| {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?;
                Ok(count.max(0) as u64)
            })
            .await
            .map_err(map_db_error)
    }

    /// Creation time for the next write: wall clock, but never earlier than
    /// anything this handle has already written or seen.
    fn next_created_at(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self.last_created_at.fetch_max(now, Ordering::SeqCst);
        previous.max(now)
    }
}

/// A row ready to be written.
#[derive(Debug)]
pub(crate) struct InsertRow {
    pub id: String,
    pub content: String,
    pub embedding: Option<Vec<u8>>,
    pub metadata: String,
    pub memory_type: String,
    pub created_at_ms: i64,
}

impl InsertRow {
    /// Returns `false` when the id already existed.
    pub fn insert_or_ignore(&self, conn: &rusqlite::Connection) -> rusqlite::Result<bool> {
        let changed = conn.execute(
            "INSERT OR IGNORE INTO memories (id, content, embedding, metadata, memory_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.id,
                self.content,
                self.embedding,
                self.metadata,
                self.memory_type,
                self.created_at_ms
            ],
        )?;
        Ok(changed > 0)
    }

    /// Insert or overwrite by id. The update path fires the content trigger,
    /// so the full-text index follows.
    pub fn upsert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO memories (id, content, embedding, metadata, memory_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                 content = excluded.content,
                 embedding = excluded.embedding,
                 metadata = excluded.metadata,
                 memory_type = excluded.memory_type,
                 created_at = excluded.created_at",
            params![
                self.id,
                self.content,
                self.embedding,
                self.metadata,
                self.memory_type,
                self.created_at_ms
            ],
        )?;
        Ok(())
    }
}

/// Random-looking id: digest of content, clock and a fresh UUID.
pub(crate) fn generate_id(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.update(
        Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .to_le_bytes(),
    );
    hasher.update(uuid::Uuid::new_v4().as_bytes());
    short_hex(&hasher.finalize())
}

/// Stable id derived from content alone, for records that arrive without one.
pub(crate) fn content_id(content: &str) -> String {
    short_hex(&Sha256::digest(content.as_bytes()))
}

fn short_hex(digest: &[u8]) -> String {
    digest
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>()
        .chars()
        .take(ID_LENGTH)
        .collect()
}

/// Decode a row selected with [`RECORD_COLUMNS`].
pub(crate) fn record_from_row(row: &Row<'_>) -> rusqlite::Result<MemoryRecord> {
    let id: String = row.get(0)?;
    let blob: Option<Vec<u8>> = row.get(2)?;
    let embedding = match blob {
        Some(bytes) => match codec::decode(&bytes) {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!("Unreadable embedding for {}: {}", id, e);
                None
            }
        },
        None => None,
    };

    Ok(MemoryRecord {
        content: row.get(1)?,
        embedding,
        metadata: metadata_from_sql(row.get(3)?),
        created_at: created_at_from_sql(row.get_ref(4)?),
        id,
    })
}

/// Metadata text is parsed leniently; NULL or malformed text yields defaults.
pub(crate) fn metadata_from_sql(text: Option<String>) -> MemoryMetadata {
    text.map(|t| MemoryMetadata::from_json_str(&t))
        .unwrap_or_default()
}

/// `created_at` is epoch milliseconds; older databases may hold text.
pub(crate) fn created_at_from_sql(value: ValueRef<'_>) -> DateTime<Utc> {
    let parsed = match value {
        ValueRef::Integer(ms) => timestamp::from_millis(ms),
        ValueRef::Real(ms) => timestamp::from_millis(ms as i64),
        ValueRef::Text(text) => std::str::from_utf8(text)
            .ok()
            .and_then(|s| timestamp::from_value(&Value::String(s.to_string()))),
        _ => None,
    };
    parsed.unwrap_or_default()
}

pub(crate) fn map_db_error(err: tokio_rusqlite::Error) -> MemoryError {
    match err {
        tokio_rusqlite::Error::ConnectionClosed => {
            MemoryError::ConnectionError("connection closed".to_string())
        }
        other => MemoryError::StorageError(other.to_string()),
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
