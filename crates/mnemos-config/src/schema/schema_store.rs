//! Store configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::default_data_dir;

/// Persistent store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Newline-delimited JSON log written by older releases.
    /// Imported once on startup, then renamed.
    #[serde(default = "default_legacy_log_path")]
    pub legacy_log_path: Option<PathBuf>,

    /// Dimensionality of every stored embedding.
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    /// Use the full-text index when the engine supports it.
    /// `false` forces keyword search into its degraded (empty) mode.
    #[serde(default = "default_full_text")]
    pub full_text: bool,

    /// Page cache budget in KiB.
    #[serde(default = "default_cache_size_kib")]
    pub cache_size_kib: u32,

    /// How long a statement waits on a locked database.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            legacy_log_path: default_legacy_log_path(),
            embedding_dimension: default_embedding_dimension(),
            full_text: default_full_text(),
            cache_size_kib: default_cache_size_kib(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_store_path() -> PathBuf {
    default_data_dir().join("memory.db")
}

fn default_legacy_log_path() -> Option<PathBuf> {
    Some(default_data_dir().join("memories.jsonl"))
}

fn default_embedding_dimension() -> usize {
    384
}

fn default_full_text() -> bool {
    true
}

fn default_cache_size_kib() -> u32 {
    8192
}

fn default_busy_timeout_ms() -> u64 {
    5000
}
