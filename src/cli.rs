//! CLI definitions for mnemos.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// mnemos CLI.
#[derive(Parser)]
#[command(name = "mnemos")]
#[command(about = "Hybrid semantic memory store")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.mnemos/config.toml)
    #[arg(short, long, global = true, env = "MNEMOS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Store a new memory
    Add {
        /// Memory text
        content: String,

        /// Memory type
        #[arg(short = 't', long = "type")]
        memory_type: Option<String>,

        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Where the memory came from
        #[arg(long)]
        source: Option<String>,
    },

    /// Search memories
    Search {
        /// Query text
        query: String,

        /// Retrieval mode
        #[arg(short, long, value_enum, default_value_t = SearchMode::Hybrid)]
        mode: SearchMode,

        /// Maximum number of results (default from config)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only return memories of this type
        #[arg(short = 't', long = "type")]
        memory_type: Option<String>,

        /// Minimum score (vector and hybrid modes)
        #[arg(long)]
        min_score: Option<f32>,
    },

    /// List memories of one type, newest first
    List {
        /// Memory type
        #[arg(short = 't', long = "type")]
        memory_type: String,
    },

    /// Show store statistics
    Stats,

    /// Export all memories to a JSON file
    Export {
        /// Output file
        file: PathBuf,
    },

    /// Import memories from a JSON file produced by `export`
    Import {
        /// Input file
        file: PathBuf,
    },

    /// Delete one memory
    Delete {
        /// Memory id
        id: String,
    },

    /// Delete every memory
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },

    /// Import a legacy JSON-lines memory log
    Migrate {
        /// Legacy log path (default from config)
        #[arg(long)]
        legacy: Option<PathBuf>,
    },

    /// Generate embeddings for memories that lack a usable one
    Reembed,
}

impl Commands {
    /// `migrate` runs the legacy import itself instead of during startup.
    pub fn migrates_on_startup(&self) -> bool {
        !matches!(self, Commands::Migrate { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum SearchMode {
    Vector,
    Keyword,
    Hybrid,
}
