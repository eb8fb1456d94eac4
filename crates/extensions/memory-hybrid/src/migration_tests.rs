use super::*;
use crate::store::StoreOptions;
use crate::testing::{memory_store, memory_store_with, TEST_DIMENSION};

const LEGACY_LOG: &str = r#"{"id":"m1","content":"I prefer window seats","metadata":{"type":"preference"},"created_at":1700000000000}
{"id":"m2","content":"Dentist on Friday","embedding":null,"metadata":"{\"type\":\"schedule\"}","created_at":"2024-03-01T09:00:00Z"}

not json at all
{"content":"No id on this one"}
"#;

fn write_log(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("memories.jsonl");
    std::fs::write(&path, LEGACY_LOG).unwrap();
    path
}

#[test]
fn test_parse_array_embedding() {
    let row = parse_legacy_line(r#"{"id":"a","content":"x","embedding":[1,0,0.5]}"#, 3).unwrap();
    assert_eq!(row.id, "a");
    assert_eq!(row.embedding, Some(codec::encode(&[1.0, 0.0, 0.5])));
}

#[test]
fn test_parse_index_keyed_embedding() {
    let row = parse_legacy_line(
        r#"{"id":"a","content":"x","embedding":{"0":0.5,"1":0.25,"2":1}}"#,
        3,
    )
    .unwrap();
    assert_eq!(row.embedding, Some(codec::encode(&[0.5, 0.25, 1.0])));
}

#[test]
fn test_parse_wrong_dimension_drops_embedding() {
    let row = parse_legacy_line(r#"{"id":"a","content":"x","embedding":[1,0]}"#, 3).unwrap();
    assert!(row.embedding.is_none());
}

#[test]
fn test_parse_rejects_malformed_embedding() {
    let err = parse_legacy_line(r#"{"id":"a","content":"x","embedding":"oops"}"#, 3).unwrap_err();
    assert!(!err.is_empty());
    assert!(parse_legacy_line(r#"{"id":"a","content":"x","embedding":[1,"two",3]}"#, 3).is_err());
}

#[test]
fn test_parse_missing_id_uses_content_digest() {
    let a = parse_legacy_line(r#"{"content":"same text"}"#, 3).unwrap();
    let b = parse_legacy_line(r#"{"content":"same text"}"#, 3).unwrap();
    assert_eq!(a.id, b.id);
    assert_eq!(a.id, content_id("same text"));
}

#[test]
fn test_parse_metadata_shapes() {
    let row = parse_legacy_line(r#"{"id":"a","content":"x","metadata":"{\"type\":\"fact\"}"}"#, 3).unwrap();
    assert_eq!(row.memory_type, "fact");

    let row = parse_legacy_line(r#"{"id":"a","content":"x","metadata":{"type":42,"mood":"ok"}}"#, 3).unwrap();
    assert_eq!(row.memory_type, "general");
    assert!(row.metadata.contains("mood"));

    let row = parse_legacy_line(r#"{"id":"a","content":"x"}"#, 3).unwrap();
    assert_eq!(row.memory_type, "general");
}

#[test]
fn test_parse_created_at_shapes() {
    let row = parse_legacy_line(r#"{"id":"a","content":"x","created_at":1700000000000}"#, 3).unwrap();
    assert_eq!(row.created_at_ms, 1_700_000_000_000);

    let row = parse_legacy_line(r#"{"id":"a","content":"x","created_at":"2024-01-02T03:04:05Z"}"#, 3).unwrap();
    assert_eq!(row.created_at_ms, 1_704_164_645_000);

    let row = parse_legacy_line(
        r#"{"id":"a","content":"x","metadata":{"timestamp":"2024-01-02T03:04:05Z"}}"#,
        3,
    )
    .unwrap();
    assert_eq!(row.created_at_ms, 1_704_164_645_000);
}

#[test]
fn test_parse_rejects_bad_lines() {
    assert!(parse_legacy_line("not json", 3).is_err());
    assert!(parse_legacy_line(r#"{"id":"a"}"#, 3).is_err());
    assert!(parse_legacy_line(r#"{"id":"a","content":"  "}"#, 3).is_err());
}

#[tokio::test]
async fn test_import_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(&dir);
    let store = memory_store().await;

    let first = store.import_legacy_log(&path).await.unwrap();
    assert_eq!(first.succeeded, 3);
    assert_eq!(first.failed, 1);
    assert_eq!(first.failures[0].item, "line 4");

    let second = store.import_legacy_log(&path).await.unwrap();
    assert_eq!(second.succeeded, 0);
    assert_eq!(second.skipped, 3);

    assert_eq!(store.count().await.unwrap(), 3);
    assert!(path.exists());

    let dentist = store.get_memory("m2").await.unwrap().unwrap();
    assert_eq!(dentist.memory_type(), "schedule");
    assert!(dentist.embedding.is_none());
}

#[tokio::test]
async fn test_invalid_utf8_line_fails_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memories.jsonl");
    let mut log = Vec::new();
    log.extend_from_slice(b"{\"id\":\"g1\",\"content\":\"first good line\"}\r\n");
    log.extend_from_slice(b"{\"id\":\"bad\",\"content\":\"caf\xe9\"}\n");
    log.extend_from_slice(b"{\"id\":\"g2\",\"content\":\"second good line\"}\n");
    std::fs::write(&path, log).unwrap();

    let store = memory_store().await;
    let report = store.migrate_legacy_log(&path).await.unwrap();
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures[0].item, "line 2");

    assert_eq!(store.count().await.unwrap(), 2);
    assert!(store.get_memory("g1").await.unwrap().is_some());
    assert!(store.get_memory("bad").await.unwrap().is_none());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_migrate_archives_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(&dir);
    let store = memory_store().await;

    let report = store.migrate_legacy_log(&path).await.unwrap();
    assert_eq!(report.succeeded, 3);
    assert!(!path.exists());

    let archived: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("memories.jsonl.migrated-"))
        .collect();
    assert_eq!(archived.len(), 1);
}

#[tokio::test]
async fn test_migrate_keeps_log_when_nothing_imported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(&dir);
    let store = memory_store().await;

    store.import_legacy_log(&path).await.unwrap();
    let report = store.migrate_legacy_log(&path).await.unwrap();
    assert_eq!(report.succeeded, 0);
    assert!(path.exists());
}

#[tokio::test]
async fn test_migrate_missing_file() {
    let store = memory_store().await;
    let report = store
        .migrate_legacy_log("/nonexistent/mnemos/memories.jsonl")
        .await
        .unwrap();
    assert_eq!(report.total(), 0);
}

#[tokio::test]
async fn test_import_missing_file_is_io_error() {
    let store = memory_store().await;
    let result = store.import_legacy_log("/nonexistent/mnemos/memories.jsonl").await;
    assert!(matches!(result, Err(MemoryError::Io(_))));
}

#[tokio::test]
async fn test_initialize_migrates_configured_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(&dir);
    let store = memory_store_with(StoreOptions {
        legacy_log_path: Some(path.clone()),
        ..StoreOptions::default()
    })
    .await;

    assert_eq!(store.count().await.unwrap(), 3);
    assert!(!path.exists());

    let report = store.initialize().await.unwrap();
    assert!(report.legacy.is_none());
}

#[tokio::test]
async fn test_legacy_embedding_of_store_dimension_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memories.jsonl");
    let vector: Vec<f32> = (0..TEST_DIMENSION).map(|i| if i == 0 { 1.0 } else { 0.0 }).collect();
    let line = serde_json::json!({"id": "v", "content": "with vector", "embedding": vector});
    std::fs::write(&path, format!("{}\n", line)).unwrap();

    let store = memory_store().await;
    store.import_legacy_log(&path).await.unwrap();
    let record = store.get_memory("v").await.unwrap().unwrap();
    assert_eq!(record.embedding, Some(vector));
}
