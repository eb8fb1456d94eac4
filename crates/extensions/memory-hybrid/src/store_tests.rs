use super::*;
use crate::testing::{memory_store, typed, uninitialized_store, TEST_DIMENSION};
use mnemos_protocols::{HybridSearchOptions, KeywordSearchOptions, VectorSearchOptions};

#[tokio::test]
async fn test_operations_require_initialize() {
    let store = uninitialized_store().await;

    assert!(matches!(
        store.add_memory("hello", MemoryMetadata::default()).await,
        Err(MemoryError::NotInitialized)
    ));
    assert!(matches!(
        store.search_memories("hello", &VectorSearchOptions::default()).await,
        Err(MemoryError::NotInitialized)
    ));
    assert!(matches!(
        store.keyword_search("hello", &KeywordSearchOptions::default()).await,
        Err(MemoryError::NotInitialized)
    ));
    assert!(matches!(
        store.hybrid_search("hello", &HybridSearchOptions::default()).await,
        Err(MemoryError::NotInitialized)
    ));
    assert!(matches!(store.count().await, Err(MemoryError::NotInitialized)));
    assert!(matches!(
        store.delete_memory("x").await,
        Err(MemoryError::NotInitialized)
    ));
    assert!(matches!(
        store.clear_all_memories().await,
        Err(MemoryError::NotInitialized)
    ));
    assert!(matches!(
        store.get_memory_stats().await,
        Err(MemoryError::NotInitialized)
    ));
    assert!(matches!(
        store.export_memories().await,
        Err(MemoryError::NotInitialized)
    ));
    assert!(matches!(
        store.import_memories(Vec::new()).await,
        Err(MemoryError::NotInitialized)
    ));
    assert!(store.capabilities().is_none());
}

#[tokio::test]
async fn test_add_and_get() {
    let store = memory_store().await;
    let added = store
        .add_memory("Remember the milk", typed("task").with_source("chat"))
        .await
        .unwrap();

    assert!(added.inserted);
    assert_eq!(added.id.len(), 16);
    assert!(added.id.chars().all(|c| c.is_ascii_hexdigit()));

    let record = store.get_memory(&added.id).await.unwrap().unwrap();
    assert_eq!(record.content, "Remember the milk");
    assert_eq!(record.memory_type(), "task");
    assert_eq!(record.metadata.source.as_deref(), Some("chat"));
    assert_eq!(record.embedding.as_ref().map(Vec::len), Some(TEST_DIMENSION));
    assert_eq!(record.metadata.timestamp, Some(record.created_at));
}

#[tokio::test]
async fn test_default_type_is_general() {
    let store = memory_store().await;
    let added = store
        .add_memory("untyped", MemoryMetadata::default())
        .await
        .unwrap();
    let record = store.get_memory(&added.id).await.unwrap().unwrap();
    assert_eq!(record.memory_type(), "general");
}

#[tokio::test]
async fn test_caller_timestamp_is_kept() {
    let store = memory_store().await;
    let origin = timestamp::from_millis(1_600_000_000_000).unwrap();
    let mut metadata = MemoryMetadata::default();
    metadata.timestamp = Some(origin);

    let added = store.add_memory("from the past", metadata).await.unwrap();
    let record = store.get_memory(&added.id).await.unwrap().unwrap();
    assert_eq!(record.metadata.timestamp, Some(origin));
    assert!(record.created_at > origin);
}

#[tokio::test]
async fn test_empty_content_rejected() {
    let store = memory_store().await;
    let result = store.add_memory("   ", MemoryMetadata::default()).await;
    assert!(matches!(result, Err(MemoryError::InvalidInput(_))));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_get_missing_returns_none() {
    let store = memory_store().await;
    assert!(store.get_memory("does-not-exist").await.unwrap().is_none());
}

#[tokio::test]
async fn test_ids_are_unique_for_same_content() {
    let store = memory_store().await;
    let a = store.add_memory("same", MemoryMetadata::default()).await.unwrap();
    let b = store.add_memory("same", MemoryMetadata::default()).await.unwrap();
    assert_ne!(a.id, b.id);
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_created_at_is_monotonic() {
    let store = memory_store().await;
    let mut previous = None;
    for i in 0..20 {
        let added = store
            .add_memory(&format!("note {}", i), MemoryMetadata::default())
            .await
            .unwrap();
        let record = store.get_memory(&added.id).await.unwrap().unwrap();
        if let Some(previous) = previous {
            assert!(record.created_at >= previous);
        }
        previous = Some(record.created_at);
    }
}

#[tokio::test]
async fn test_duplicate_id_is_ignored() {
    let store = memory_store().await;
    let row = InsertRow {
        id: "fixed".to_string(),
        content: "first".to_string(),
        embedding: None,
        metadata: "{}".to_string(),
        memory_type: "general".to_string(),
        created_at_ms: 1,
    };
    let (first, second) = store
        .conn
        .call(move |conn| {
            let first = row.insert_or_ignore(conn)?;
            let second = row.insert_or_ignore(conn)?;
            Ok((first, second))
        })
        .await
        .unwrap();

    assert!(first);
    assert!(!second);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_initialize_twice() {
    let store = memory_store().await;
    store.add_memory("kept", MemoryMetadata::default()).await.unwrap();

    let report = store.initialize().await.unwrap();
    assert!(!report.type_column_added);
    assert!(!report.fts_rebuilt);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_file_store_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("memory.db");

    let store = MemoryStore::open(&path, FallbackEmbedder::hash_only(TEST_DIMENSION), StoreOptions::default())
        .await
        .unwrap();
    let report = store.initialize().await.unwrap();
    assert_eq!(report.journal_mode.to_lowercase(), "wal");
    let added = store.add_memory("durable", MemoryMetadata::default()).await.unwrap();
    store.close().await.unwrap();

    let reopened = MemoryStore::open(&path, FallbackEmbedder::hash_only(TEST_DIMENSION), StoreOptions::default())
        .await
        .unwrap();
    reopened.initialize().await.unwrap();
    let record = reopened.get_memory(&added.id).await.unwrap().unwrap();
    assert_eq!(record.content, "durable");
}

#[test]
fn test_content_id_is_stable() {
    assert_eq!(content_id("hello"), content_id("hello"));
    assert_ne!(content_id("hello"), content_id("world"));
    assert_eq!(content_id("hello").len(), 16);
}

#[test]
fn test_created_at_from_text() {
    let parsed = created_at_from_sql(ValueRef::Text(b"2024-01-02 03:04:05"));
    assert_eq!(parsed.to_rfc3339(), "2024-01-02T03:04:05+00:00");

    let parsed = created_at_from_sql(ValueRef::Integer(1_700_000_000_000));
    assert_eq!(parsed.timestamp_millis(), 1_700_000_000_000);

    let parsed = created_at_from_sql(ValueRef::Null);
    assert_eq!(parsed.timestamp_millis(), 0);
}
