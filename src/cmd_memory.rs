//! Memory commands: add, search, list.

use serde_json::{json, Value};

use mnemos_config::Config;
use mnemos_memory_hybrid::MemoryStore;
use mnemos_protocols::{MemoryMetadata, MemoryRecord, DEFAULT_MEMORY_TYPE};

use crate::adapters::{hybrid_options, keyword_options, vector_options};
use crate::cli::SearchMode;

pub(crate) async fn run_add(
    store: &MemoryStore,
    content: &str,
    memory_type: Option<String>,
    tags: Vec<String>,
    source: Option<String>,
) -> anyhow::Result<Value> {
    let mut metadata =
        MemoryMetadata::new(memory_type.unwrap_or_else(|| DEFAULT_MEMORY_TYPE.to_string()))
            .with_tags(tags);
    if let Some(source) = source {
        metadata = metadata.with_source(source);
    }

    let added = store.add_memory(content, metadata).await?;
    Ok(serde_json::to_value(added)?)
}

pub(crate) async fn run_search(
    store: &MemoryStore,
    config: &Config,
    query: &str,
    mode: SearchMode,
    limit: Option<usize>,
    memory_type: Option<String>,
    min_score: Option<f32>,
) -> anyhow::Result<Value> {
    let search = &config.search;
    let results = match mode {
        SearchMode::Vector => {
            store
                .search_memories(query, &vector_options(search, limit, memory_type, min_score))
                .await?
        }
        SearchMode::Keyword => {
            store
                .keyword_search(query, &keyword_options(search, limit, memory_type))
                .await?
        }
        SearchMode::Hybrid => {
            store
                .hybrid_search(query, &hybrid_options(search, limit, memory_type, min_score))
                .await?
        }
    };
    Ok(serde_json::to_value(results)?)
}

pub(crate) async fn run_list(store: &MemoryStore, memory_type: &str) -> anyhow::Result<Value> {
    let records = store.get_memories_by_type(memory_type).await?;
    Ok(Value::Array(records.iter().map(summary).collect()))
}

/// A record without its embedding, for display.
fn summary(record: &MemoryRecord) -> Value {
    json!({
        "id": record.id,
        "content": record.content,
        "metadata": record.metadata,
        "created_at": record.created_at,
        "has_embedding": record.embedding.is_some(),
    })
}
