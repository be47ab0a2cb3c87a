//! Search backend implementations.
//!
//! # Available Backends
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | Elasticsearch | `elasticsearch` (default) | Remote search engine, the production target |
//! | Memory | always | In-process document map evaluating the same Query DSL subset |
//!
//! # Example
//!
//! ```
//! use kubedex_persistence::backends::memory::MemoryBackend;
//! use kubedex_persistence::core::SearchBackend;
//!
//! let backend = MemoryBackend::new();
//! assert_eq!(backend.name(), "memory");
//! ```

pub mod elasticsearch;
pub mod memory;
