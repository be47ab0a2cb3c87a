//! Core storage traits and abstractions.
//!
//! This module provides the foundational traits for the persistence layer:
//!
//! - [`SearchBackend`] - Search engine driver abstraction
//! - [`ResourceStorage`] - Per-kind CRUD and list operations
//!
//! # Example: Implementing a Search Backend
//!
//! ```ignore
//! use async_trait::async_trait;
//! use kubedex_persistence::core::{BackendKind, SearchBackend, SearchHits};
//! use kubedex_persistence::error::BackendError;
//!
//! #[derive(Debug)]
//! struct MyBackend;
//!
//! #[async_trait]
//! impl SearchBackend for MyBackend {
//!     fn kind(&self) -> BackendKind {
//!         BackendKind::Custom("my-backend")
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "my-backend"
//!     }
//!
//!     async fn search(&self, indices: &[&str], query: serde_json::Value)
//!         -> Result<SearchHits, BackendError> {
//!         todo!()
//!     }
//!
//!     // ... implement other required methods
//! }
//! ```

pub mod backend;
pub mod storage;

pub use backend::{BackendKind, SearchBackend, SearchHit, SearchHits};
pub use storage::ResourceStorage;
