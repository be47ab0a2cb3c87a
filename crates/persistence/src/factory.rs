//! Storage factory.
//!
//! The factory is the entry point a host storage registry holds on to: it
//! names and bootstraps per-kind indices, hands out bound
//! [`ResourceStore`]s, and performs the cluster-wide maintenance operations
//! that span every kind.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::backends::elasticsearch::schema::{create_index_mapping, ensure_index};
use crate::codec::ObjectCodec;
use crate::config::StorageConfig;
use crate::core::SearchBackend;
use crate::error::{StorageError, StorageResult};
use crate::query::cluster_path;
use crate::store::{ResourceStore, ResourceStoreConfig};
use crate::types::{GroupResource, GroupVersionResource, ResourceDocument};

/// Resource versions of one cluster, keyed by kind and then by `ns/name` (or
/// `name` for cluster-scoped objects).
pub type ResourceVersions = BTreeMap<GroupVersionResource, BTreeMap<String, String>>;

const INVENTORY_FIELDS: [&str; 6] = [
    "group",
    "version",
    "resource",
    "namespace",
    "name",
    "resource_version",
];

/// Builds resource stores and runs cross-kind maintenance.
#[derive(Debug)]
pub struct StorageFactory<B: ?Sized> {
    backend: Arc<B>,
    config: StorageConfig,
}

impl<B: SearchBackend + ?Sized> StorageFactory<B> {
    /// Creates a factory after validating `config`.
    pub fn new(backend: Arc<B>, config: StorageConfig) -> StorageResult<Self> {
        config.validate()?;
        Ok(Self { backend, config })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Returns the index name for a kind: `{prefix}-{group|core}-{resource}`.
    pub fn index_name(&self, group_resource: &GroupResource) -> String {
        let group = if group_resource.group.is_empty() {
            "core"
        } else {
            group_resource.group.as_str()
        };
        format!(
            "{}-{}-{}",
            self.config.index_prefix, group, group_resource.resource
        )
        .to_lowercase()
    }

    /// Creates the kind's index if it does not exist yet and returns its name.
    pub async fn ensure_resource_index(
        &self,
        group_resource: &GroupResource,
    ) -> StorageResult<String> {
        let index = self.index_name(group_resource);
        let mapping = create_index_mapping(&self.config, group_resource);
        ensure_index(&*self.backend, &index, mapping).await?;
        Ok(index)
    }

    /// Returns a store bound to `identity`, bootstrapping its index first.
    pub async fn new_resource_storage<C: ObjectCodec>(
        &self,
        identity: GroupVersionResource,
        codec: C,
    ) -> StorageResult<ResourceStore<B, C>> {
        let index = self.ensure_resource_index(&identity.group_resource()).await?;
        debug!(index = %index, "Bound resource storage for {}", identity);
        Ok(ResourceStore::new(
            Arc::clone(&self.backend),
            codec,
            ResourceStoreConfig {
                identity,
                index,
                alias: self.config.resource_alias.clone(),
            },
        ))
    }

    /// Deletes every document of `cluster`, across all kinds.
    pub async fn clean_cluster(&self, cluster: &str) -> StorageResult<()> {
        let alias = self.config.resource_alias.as_str();
        let query = json!({
            "query": {
                "bool": {
                    "must": [{"term": {cluster_path(): cluster}}]
                }
            }
        });
        self.backend
            .delete_by_query(&[alias], query)
            .await
            .map_err(|e| {
                StorageError::backend_call(format!("clean cluster {} in {}", cluster, alias), e)
            })?;

        info!(cluster, "Cleaned cluster");
        Ok(())
    }

    /// Deletes the documents of one kind of one cluster.
    pub async fn clean_cluster_resource(
        &self,
        cluster: &str,
        gvr: &GroupVersionResource,
    ) -> StorageResult<()> {
        let index = self.index_name(&gvr.group_resource());
        let query = json!({
            "query": {
                "bool": {
                    "must": [
                        {"term": {"group": gvr.group}},
                        {"term": {"version": gvr.version}},
                        {"term": {"resource": gvr.resource}},
                        {"term": {cluster_path(): cluster}}
                    ]
                }
            }
        });
        self.backend
            .delete_by_query(&[index.as_str()], query)
            .await
            .map_err(|e| {
                StorageError::backend_call(
                    format!("clean cluster {} resource {} in {}", cluster, gvr, index),
                    e,
                )
            })?;

        info!(cluster, resource = %gvr, "Cleaned cluster resource");
        Ok(())
    }

    /// Returns the stored resource version of every object of `cluster`.
    ///
    /// At most `max_result_window` documents are read.
    pub async fn get_resource_versions(&self, cluster: &str) -> StorageResult<ResourceVersions> {
        let alias = self.config.resource_alias.as_str();
        let query = json!({
            "size": self.config.max_result_window,
            "_source": INVENTORY_FIELDS,
            "query": {
                "bool": {
                    "must": [{"term": {cluster_path(): cluster}}]
                }
            }
        });
        let hits = self
            .backend
            .search(&[alias], query)
            .await
            .map_err(|e| {
                let context = format!("list resource versions of {} in {}", cluster, alias);
                StorageError::backend_call(context, e)
            })?;

        if hits.total > hits.len() as u64 {
            tracing::warn!(
                cluster,
                total = hits.total,
                read = hits.len(),
                "Resource version inventory truncated at max_result_window"
            );
        }

        let mut versions = ResourceVersions::new();
        for hit in hits.hits {
            let Some(document) = inventory_document(hit.source) else {
                continue;
            };
            versions
                .entry(document.group_version_resource())
                .or_default()
                .insert(document.key(), document.resource_version);
        }
        Ok(versions)
    }
}

/// Reads the identity fields of an inventory hit; hits lacking them are skipped.
fn inventory_document(mut source: Value) -> Option<ResourceDocument> {
    let map = source.as_object_mut()?;
    map.entry("object").or_insert(Value::Null);
    serde_json::from_value(source).ok()
}
