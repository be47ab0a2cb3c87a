//! Backend abstraction for search engines.
//!
//! This module defines the [`SearchBackend`] trait, the only surface of the
//! document-search engine the storage layer consumes: search, index by id,
//! delete by id, delete by query, and index bootstrap.

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BackendError;

/// Identifies the type of search backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Elasticsearch (remote search engine).
    Elasticsearch,
    /// In-process document map.
    Memory,
    /// Custom or unknown backend.
    Custom(&'static str),
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Elasticsearch => write!(f, "elasticsearch"),
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Backend document id.
    pub id: String,
    /// The stored document, possibly restricted by a `_source` filter.
    pub source: Value,
}

/// The outcome of a search call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchHits {
    /// Number of documents matching the query, across all pages.
    pub total: u64,
    /// False when the backend only gives a lower bound for `total`.
    pub total_is_exact: bool,
    /// The requested page of hits.
    pub hits: Vec<SearchHit>,
}

impl SearchHits {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Request/response contract of a document-search engine.
///
/// Implementations perform no retries; every failure is returned as-is so the
/// caller decides. Dropping a returned future abandons the request.
#[async_trait]
pub trait SearchBackend: Debug + Send + Sync {
    /// Returns the backend kind.
    fn kind(&self) -> BackendKind;

    /// Returns a human-readable backend name used in error messages.
    fn name(&self) -> &'static str;

    /// Runs a query document against one or more indices or aliases.
    async fn search(&self, indices: &[&str], query: Value) -> Result<SearchHits, BackendError>;

    /// Writes `document` under `id`, replacing any previous version.
    async fn index_document(&self, index: &str, id: &str, document: Value)
    -> Result<(), BackendError>;

    /// Deletes a document by id. A missing document is not an error.
    async fn delete_document(&self, index: &str, id: &str) -> Result<(), BackendError>;

    /// Deletes every document matching `query`.
    async fn delete_by_query(&self, indices: &[&str], query: Value) -> Result<(), BackendError>;

    /// Returns whether the index exists.
    async fn index_exists(&self, index: &str) -> Result<bool, BackendError>;

    /// Creates an index with the given mapping. "Already exists" is success.
    async fn create_index(&self, index: &str, mapping: Value) -> Result<(), BackendError>;
}
