//! Memory store data model.
//!
//! A [`MemoryRecord`] is the durable unit; [`SearchResult`] is the ephemeral
//! ranked view of one produced by any of the three search modes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::timestamp;

/// Memory type used when metadata carries none.
pub const DEFAULT_MEMORY_TYPE: &str = "general";

fn default_memory_type() -> String {
    DEFAULT_MEMORY_TYPE.to_string()
}

/// Tags as a string array or a comma-separated string. `None` when the value
/// has any other shape, so the caller can keep it untouched.
fn parse_tags(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        Value::String(s) => Some(
            s.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    }
}

/// Provenance metadata attached to every memory.
///
/// Well-known fields are typed. Anything else a writer attached, including a
/// well-known key whose value does not fit its typed field, is kept verbatim
/// in `extra` and written back out on export. `type` always resolves to a
/// non-blank string: missing, blank or non-string values become
/// [`DEFAULT_MEMORY_TYPE`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryMetadata {
    /// When the memory was recorded by its origin.
    pub timestamp: Option<DateTime<Utc>>,

    /// Origin type ("general", "conversation", "fact", ...). Serialized as `type`.
    pub memory_type: String,

    /// Where the memory came from (channel, tool, import).
    pub source: Option<String>,

    pub tags: Vec<String>,

    /// Extension fields not covered above.
    pub extra: Map<String, Value>,
}

impl Serialize for MemoryMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(timestamp) = &self.timestamp {
            map.serialize_entry("timestamp", timestamp)?;
        }
        map.serialize_entry("type", &self.memory_type)?;
        if let Some(source) = &self.source {
            map.serialize_entry("source", source)?;
        }
        if !self.tags.is_empty() {
            map.serialize_entry("tags", &self.tags)?;
        }
        // Typed fields win over an `extra` entry of the same name.
        for (key, value) in &self.extra {
            let shadowed = match key.as_str() {
                "type" => true,
                "timestamp" => self.timestamp.is_some(),
                "source" => self.source.is_some(),
                "tags" => !self.tags.is_empty(),
                _ => false,
            };
            if !shadowed {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MemoryMetadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_json(Value::deserialize(deserializer)?))
    }
}

impl Default for MemoryMetadata {
    fn default() -> Self {
        Self {
            timestamp: None,
            memory_type: default_memory_type(),
            source: None,
            tags: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl MemoryMetadata {
    pub fn new(memory_type: impl Into<String>) -> Self {
        Self {
            memory_type: memory_type.into(),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Build metadata from an arbitrary JSON value without failing.
    ///
    /// Non-object values yield default metadata.
    pub fn from_json(value: Value) -> Self {
        let Value::Object(mut extra) = value else {
            return Self::default();
        };

        let memory_type = match extra.remove("type") {
            Some(Value::String(s)) if !s.trim().is_empty() => s,
            _ => default_memory_type(),
        };
        let timestamp = extra.get("timestamp").and_then(timestamp::from_value);
        if timestamp.is_some() {
            extra.remove("timestamp");
        }
        let source = match extra.remove("source") {
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                extra.insert("source".to_string(), other);
                None
            }
            None => None,
        };
        let tags = match extra.remove("tags") {
            Some(value) => match parse_tags(&value) {
                Some(tags) => tags,
                None => {
                    extra.insert("tags".to_string(), value);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        Self {
            timestamp,
            memory_type,
            source,
            tags,
            extra,
        }
    }

    /// Parse metadata stored as JSON text, falling back to defaults.
    pub fn from_json_str(text: &str) -> Self {
        serde_json::from_str::<Value>(text)
            .map(Self::from_json)
            .unwrap_or_default()
    }
}

/// A stored memory.
///
/// This is also the export/import interchange format:
/// `{id, content, embedding: number[] | null, metadata, created_at}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,

    pub content: String,

    #[serde(default)]
    pub embedding: Option<Vec<f32>>,

    #[serde(default)]
    pub metadata: MemoryMetadata,

    #[serde(default = "Utc::now", deserialize_with = "timestamp::deserialize_or_now")]
    pub created_at: DateTime<Utc>,
}

impl MemoryRecord {
    /// The denormalized type, always derived from metadata.
    pub fn memory_type(&self) -> &str {
        &self.metadata.memory_type
    }
}

/// Outcome of a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddedMemory {
    pub id: String,
    /// `false` when an identical id already existed and the insert was ignored.
    pub inserted: bool,
}

/// A ranked search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub content: String,
    pub metadata: MemoryMetadata,
    /// Cosine similarity, normalized keyword relevance or fused score,
    /// depending on the search mode.
    pub score: f32,
    pub timestamp: DateTime<Utc>,
    /// Vector leg score (hybrid only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_score: Option<f32>,
    /// Normalized keyword leg score (hybrid only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_score: Option<f32>,
}

impl SearchResult {
    pub fn memory_type(&self) -> &str {
        &self.metadata.memory_type
    }
}

/// Options for pure vector search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSearchOptions {
    pub limit: usize,
    pub min_score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_type: Option<String>,
}

impl Default for VectorSearchOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            min_score: 0.3,
            memory_type: None,
        }
    }
}

impl VectorSearchOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_type(mut self, memory_type: impl Into<String>) -> Self {
        self.memory_type = Some(memory_type.into());
        self
    }
}

/// Options for pure keyword search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordSearchOptions {
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_type: Option<String>,
}

impl Default for KeywordSearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            memory_type: None,
        }
    }
}

impl KeywordSearchOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_type(mut self, memory_type: impl Into<String>) -> Self {
        self.memory_type = Some(memory_type.into());
        self
    }
}

/// Options for weighted hybrid search.
///
/// Weights are applied as given; they need not sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridSearchOptions {
    pub limit: usize,
    pub min_score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_type: Option<String>,
    pub vector_weight: f32,
    pub keyword_weight: f32,
}

impl Default for HybridSearchOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            min_score: 0.2,
            memory_type: None,
            vector_weight: 0.6,
            keyword_weight: 0.4,
        }
    }
}

impl HybridSearchOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_type(mut self, memory_type: impl Into<String>) -> Self {
        self.memory_type = Some(memory_type.into());
        self
    }

    pub fn with_weights(mut self, vector_weight: f32, keyword_weight: f32) -> Self {
        self.vector_weight = vector_weight;
        self.keyword_weight = keyword_weight;
        self
    }
}

/// Optional engine features detected at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineCapabilities {
    /// Structured scalar extraction from the metadata blob.
    pub json: bool,
    /// Full-text virtual tables.
    pub full_text: bool,
}

/// Aggregate statistics over the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total: u64,
    pub with_embedding: u64,
    pub by_type: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest: Option<DateTime<Utc>>,
    pub capabilities: EngineCapabilities,
}

/// One failed item inside a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    /// Record id or line reference.
    pub item: String,
    pub message: String,
}

/// Per-item accumulator for bulk operations (import, migration, re-embedding).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationReport {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ItemFailure>,
}

impl OperationReport {
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    pub fn record_failure(&mut self, item: impl Into<String>, message: impl Into<String>) {
        self.failed += 1;
        self.failures.push(ItemFailure {
            item: item.into(),
            message: message.into(),
        });
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
