//! Core resource storage trait.
//!
//! This module defines the [`ResourceStorage`] trait, the per-kind CRUD and
//! list surface a host storage registry talks to. Every operation is scoped by
//! the origin cluster.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::types::{ListOptions, ListPage};

/// Storage for one resource kind.
///
/// Writes are upserts: `create` and `update` both replace the whole document.
///
/// # Example
///
/// ```ignore
/// use kubedex_persistence::core::ResourceStorage;
/// use kubedex_persistence::types::{LabelSelector, ListOptions};
///
/// async fn example<S: ResourceStorage>(storage: &S, object: &S::Object) -> StorageResult<()> {
///     storage.create("cluster-1", object).await?;
///     let page = storage
///         .list(&ListOptions::new().with_label_selector(LabelSelector::parse("tier=front")?))
///         .await?;
///     println!("{} objects", page.len());
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait ResourceStorage: Send + Sync {
    /// The decoded object type.
    type Object: Send + Sync;

    /// Stores a newly observed object.
    ///
    /// # Errors
    ///
    /// * `StorageError::Validation(MissingKind)` - If the object has no kind
    /// * `StorageError::BackendCall` - If the backend write fails
    async fn create(&self, cluster: &str, object: &Self::Object) -> StorageResult<()>;

    /// Replaces the stored copy of an object.
    async fn update(&self, cluster: &str, object: &Self::Object) -> StorageResult<()>;

    /// Reads the single object identified by cluster, namespace and name.
    ///
    /// # Errors
    ///
    /// * `StorageError::Resource(NotFound)` - If nothing matches
    /// * `StorageError::Resource(Duplicate)` - If more than one document matches
    async fn get(&self, cluster: &str, namespace: &str, name: &str)
    -> StorageResult<Self::Object>;

    /// Lists objects matching `opts`.
    async fn list(&self, opts: &ListOptions) -> StorageResult<ListPage<Self::Object>>;

    /// Removes an object. Objects without a UID and missing documents succeed.
    async fn delete(&self, cluster: &str, object: &Self::Object) -> StorageResult<()>;
}
