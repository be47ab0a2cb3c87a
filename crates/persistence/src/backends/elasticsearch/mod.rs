//! Elasticsearch backend implementation.
//!
//! # Index Structure
//!
//! Each resource kind gets its own index:
//! `{prefix}-{group|core}-{resource}` (e.g., `kubedex-apps-deployments`)
//!
//! Every index carries the shared resource alias (default `kubedex_resource`),
//! which owner resolution and cluster cleanup search across kinds.
//!
//! The mapping helpers in [`schema`] are plain JSON and always available; the
//! client ([`ElasticsearchBackend`]) needs the `elasticsearch` feature.
//!
//! # Example
//!
//! ```ignore
//! use kubedex_persistence::backends::elasticsearch::ElasticsearchBackend;
//! use kubedex_persistence::config::StorageConfig;
//!
//! let config = StorageConfig {
//!     nodes: vec!["http://localhost:9200".to_string()],
//!     ..Default::default()
//! };
//! let backend = ElasticsearchBackend::new(config)?;
//! ```

#[cfg(feature = "elasticsearch")]
mod backend;
pub mod schema;

#[cfg(feature = "elasticsearch")]
pub use backend::ElasticsearchBackend;
pub use schema::{create_index_mapping, ensure_index};
