//! Shared fixtures for unit tests.

use mnemos_memory_vector::FallbackEmbedder;
use mnemos_protocols::MemoryMetadata;

use crate::store::{MemoryStore, StoreOptions};

pub(crate) const TEST_DIMENSION: usize = 64;

pub(crate) async fn memory_store() -> MemoryStore {
    memory_store_with(StoreOptions::default()).await
}

pub(crate) async fn memory_store_with(options: StoreOptions) -> MemoryStore {
    let store = MemoryStore::open_in_memory(FallbackEmbedder::hash_only(TEST_DIMENSION), options)
        .await
        .unwrap();
    store.initialize().await.unwrap();
    store
}

pub(crate) async fn uninitialized_store() -> MemoryStore {
    MemoryStore::open_in_memory(
        FallbackEmbedder::hash_only(TEST_DIMENSION),
        StoreOptions::default(),
    )
    .await
    .unwrap()
}

pub(crate) fn typed(memory_type: &str) -> MemoryMetadata {
    MemoryMetadata::new(memory_type)
}

pub(crate) fn without_full_text() -> StoreOptions {
    StoreOptions {
        full_text: false,
        ..StoreOptions::default()
    }
}
