//! Maintenance commands: stats, export, import, delete, clear, migrate, reembed.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde_json::{json, Value};
use tracing::info;

use mnemos_config::Config;
use mnemos_memory_hybrid::MemoryStore;

pub(crate) async fn run_stats(store: &MemoryStore) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(store.get_memory_stats().await?)?)
}

pub(crate) async fn run_export(store: &MemoryStore, file: &Path) -> anyhow::Result<Value> {
    let exported = store
        .export_to_file(file)
        .await
        .with_context(|| format!("Failed to export to {}", file.display()))?;
    Ok(json!({ "exported": exported, "path": file }))
}

pub(crate) async fn run_import(store: &MemoryStore, file: &Path) -> anyhow::Result<Value> {
    let report = store
        .import_from_file(file)
        .await
        .with_context(|| format!("Failed to import {}", file.display()))?;
    Ok(serde_json::to_value(report)?)
}

pub(crate) async fn run_delete(store: &MemoryStore, id: &str) -> anyhow::Result<Value> {
    let deleted = store.delete_memory(id).await?;
    Ok(json!({ "id": id, "deleted": deleted }))
}

pub(crate) async fn run_clear(store: &MemoryStore, yes: bool) -> anyhow::Result<Value> {
    if !yes {
        bail!("Refusing to delete every memory without --yes");
    }
    let cleared = store.clear_all_memories().await?;
    Ok(json!({ "cleared": cleared }))
}

pub(crate) async fn run_migrate(
    store: &MemoryStore,
    config: &Config,
    legacy: Option<PathBuf>,
) -> anyhow::Result<Value> {
    let Some(path) = legacy.or_else(|| config.store.legacy_log_path.clone()) else {
        bail!("No legacy log configured; pass --legacy PATH");
    };
    info!("Migrating legacy log {}", path.display());
    let report = store
        .migrate_legacy_log(&path)
        .await
        .with_context(|| format!("Failed to migrate {}", path.display()))?;
    Ok(serde_json::to_value(report)?)
}

pub(crate) async fn run_reembed(store: &MemoryStore) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(store.reembed_missing().await?)?)
}
