//! Test infrastructure for the persistence layer.
//!
//! This module provides object fixtures and a factory over the in-memory
//! backend that the integration tests share.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use kubedex_persistence::backends::memory::MemoryBackend;
use kubedex_persistence::types::GroupVersionResource;
use kubedex_persistence::{JsonCodec, ResourceStore, StorageConfig, StorageFactory};

pub use fixtures::*;

pub type MemoryStore = ResourceStore<MemoryBackend, JsonCodec>;

/// Creates a factory over a fresh in-memory backend.
pub fn memory_factory() -> StorageFactory<MemoryBackend> {
    StorageFactory::new(Arc::new(MemoryBackend::new()), StorageConfig::default())
        .expect("default config is valid")
}

/// Creates a JSON store for `gvr`.
pub async fn json_store(
    factory: &StorageFactory<MemoryBackend>,
    gvr: GroupVersionResource,
) -> MemoryStore {
    factory
        .new_resource_storage(gvr, JsonCodec)
        .await
        .expect("Failed to create resource storage")
}
