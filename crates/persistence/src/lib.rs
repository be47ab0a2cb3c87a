//! Kubedex Persistence Layer
//!
//! This crate stores Kubernetes-style resources (group/version/resource,
//! namespace/name, free-form payload) from many origin clusters in a
//! document-search backend and answers structured list queries against them.
//!
//! # Features
//!
//! - **Generic payloads**: objects are stored as dynamic JSON; an [`ObjectCodec`]
//!   converts to and from the caller's types
//! - **Declarative lists**: cluster/namespace/name scopes, label and field
//!   selectors, fuzzy names, creation-time ranges and owner-descendant filters
//!   compile into one boolean query
//! - **Offset continuation**: stateless continue tokens plus a remaining count
//! - **Cluster maintenance**: per-cluster and per-kind cleanup, resource-version
//!   inventory
//!
//! # Backend Features
//!
//! - `elasticsearch` (default) - the Elasticsearch client backend
//!
//! The in-memory backend is always available and evaluates the same query
//! subset, which makes it suitable for tests and embedding.
//!
//! # Architecture
//!
//! - [`types`] - Resource identity, documents, list options, selectors, pages
//! - [`query`] - Query expressions and the list query compiler
//! - [`owner`] - Multi-hop owner-descendant resolution
//! - [`store`] - The per-kind [`ResourceStore`]
//! - [`factory`] - Index bootstrap and cluster-wide operations
//! - [`core`] - The [`SearchBackend`] and [`ResourceStorage`] traits
//! - [`backends`] - Elasticsearch and in-memory backends
//! - [`config`] - Storage configuration
//! - [`error`] - Error types for all operations
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use kubedex_persistence::backends::memory::MemoryBackend;
//! use kubedex_persistence::types::{GroupVersionResource, LabelSelector, ListOptions};
//! use kubedex_persistence::{JsonCodec, ResourceStorage, StorageConfig, StorageFactory};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let factory = StorageFactory::new(Arc::new(MemoryBackend::new()), StorageConfig::default())?;
//! let pods = factory
//!     .new_resource_storage(GroupVersionResource::new("", "v1", "pods"), JsonCodec)
//!     .await?;
//!
//! pods.create(
//!     "cluster-1",
//!     &json!({
//!         "apiVersion": "v1",
//!         "kind": "Pod",
//!         "metadata": {"name": "web-0", "namespace": "default", "uid": "3f0c", "labels": {"tier": "front"}}
//!     }),
//! )
//! .await?;
//!
//! let page = pods
//!     .list(
//!         &ListOptions::new()
//!             .with_clusters(["cluster-1"])
//!             .with_label_selector(LabelSelector::parse("tier=front")?),
//!     )
//!     .await?;
//! assert_eq!(page.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod codec;
pub mod config;
pub mod core;
pub mod error;
pub mod factory;
pub mod owner;
pub mod query;
pub mod store;
pub mod types;

// Re-export commonly used types at crate root
pub use codec::{JsonCodec, ObjectCodec, SerdeCodec};
pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use factory::{ResourceVersions, StorageFactory};
pub use store::{ResourceStore, ResourceStoreConfig};
pub use types::{ListOptions, ListPage};

// Re-export core traits
pub use core::{BackendKind, ResourceStorage, SearchBackend};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
