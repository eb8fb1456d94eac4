//! mnemos - hybrid semantic memory store
//!
//! Command-line entry point. Every command opens the configured store,
//! runs once and prints JSON on stdout. Logs go to stderr and, optionally,
//! a daily-rolling file.

mod adapters;
mod cli;
mod cmd_admin;
mod cmd_memory;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mnemos_config::{default_config_path, ConfigLoader, ConfigValidator, LoggingConfig};

use crate::cli::{Cli, Commands};

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let console = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    let file = if logging.file {
        std::fs::create_dir_all(&logging.directory).with_context(|| {
            format!("Failed to create log directory {}", logging.directory.display())
        })?;
        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("mnemos")
            .filename_suffix("log")
            .max_log_files(30)
            .build(&logging.directory)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // Flushes buffered lines when the process exits.
        static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
            std::sync::OnceLock::new();
        let _ = GUARD.set(guard);

        Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = ConfigLoader::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    init_tracing(&config.logging)?;

    let warnings = ConfigValidator::validate(&config).into_result()?;
    for warning in warnings {
        warn!("Config {}: {}", warning.field, warning.message);
    }
    debug!("Using store at {}", config.store.path.display());

    let store = adapters::open_store(&config, cli.command.migrates_on_startup()).await?;

    let output = match cli.command {
        Commands::Add {
            content,
            memory_type,
            tags,
            source,
        } => cmd_memory::run_add(&store, &content, memory_type, tags, source).await,
        Commands::Search {
            query,
            mode,
            limit,
            memory_type,
            min_score,
        } => {
            cmd_memory::run_search(&store, &config, &query, mode, limit, memory_type, min_score)
                .await
        }
        Commands::List { memory_type } => cmd_memory::run_list(&store, &memory_type).await,
        Commands::Stats => cmd_admin::run_stats(&store).await,
        Commands::Export { file } => cmd_admin::run_export(&store, &file).await,
        Commands::Import { file } => cmd_admin::run_import(&store, &file).await,
        Commands::Delete { id } => cmd_admin::run_delete(&store, &id).await,
        Commands::Clear { yes } => cmd_admin::run_clear(&store, yes).await,
        Commands::Migrate { legacy } => cmd_admin::run_migrate(&store, &config, legacy).await,
        Commands::Reembed => cmd_admin::run_reembed(&store).await,
    };

    store.close().await?;
    println!("{}", serde_json::to_string_pretty(&output?)?);
    Ok(())
}
