//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod schema_embedding;
mod schema_search;
mod schema_store;

pub use schema_embedding::*;
pub use schema_search::*;
pub use schema_store::*;

/// Root directory for mnemos state (`~/.mnemos`).
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mnemos")
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Expand `~` in every configured path.
    pub fn expand_paths(&mut self) {
        self.store.path = expand(&self.store.path);
        self.store.legacy_log_path = self.store.legacy_log_path.as_deref().map(expand);
        self.logging.directory = expand(&self.logging.directory);
    }
}

fn expand(path: &std::path::Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).to_string())
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to also write a daily-rolling log file.
    #[serde(default = "default_file_logging")]
    pub file: bool,

    /// Directory for log files.
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_file_logging(),
            directory: default_log_directory(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_file_logging() -> bool {
    true
}

fn default_log_directory() -> PathBuf {
    default_data_dir().join("logs")
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
