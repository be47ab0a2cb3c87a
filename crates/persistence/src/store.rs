//! Resource store bound to one resource kind.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, error};
use uuid::Uuid;

use crate::codec::ObjectCodec;
use crate::core::{ResourceStorage, SearchBackend, SearchHit};
use crate::error::{
    BackendError, CodecError, ResourceError, StorageError, StorageResult, ValidationError,
};
use crate::owner::OwnerResolver;
use crate::query::{BoolQuery, ListQueryCompiler, QueryExpression, cluster_path};
use crate::types::{
    GroupVersionResource, ListOptions, ListPage, ObjectMeta, ResourceDocument, stamp_cluster,
};

/// What a [`ResourceStore`] is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceStoreConfig {
    /// The kind every document of this store is written as.
    pub identity: GroupVersionResource,
    /// The kind's index.
    pub index: String,
    /// The shared alias used for cross-kind owner lookups.
    pub alias: String,
}

/// CRUD and list operations for one resource kind.
///
/// The store holds no state beyond its construction-time binding and can be
/// shared behind an `Arc` by any number of tasks.
pub struct ResourceStore<B: ?Sized, C> {
    backend: Arc<B>,
    codec: C,
    config: ResourceStoreConfig,
}

impl<B: ?Sized, C> fmt::Debug for ResourceStore<B, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<B, C> ResourceStore<B, C>
where
    B: SearchBackend + ?Sized,
    C: ObjectCodec,
{
    pub fn new(backend: Arc<B>, codec: C, config: ResourceStoreConfig) -> Self {
        Self {
            backend,
            codec,
            config,
        }
    }

    /// Returns the identity and index this store is bound to.
    pub fn config(&self) -> &ResourceStoreConfig {
        &self.config
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    async fn upsert(&self, operation: &str, cluster: &str, object: &C::Object) -> StorageResult<()> {
        let mut payload = self.codec.encode(object)?;
        if ObjectMeta::new(&payload).kind().is_empty() {
            return Err(ValidationError::MissingKind {
                group_version: self.config.identity.group_version(),
            }
            .into());
        }
        stamp_cluster(&mut payload, cluster);

        let document = ResourceDocument::new(&self.config.identity, payload);
        let id = match ObjectMeta::new(&document.object).uid() {
            "" => Uuid::new_v4().to_string(),
            uid => uid.to_string(),
        };
        let context = format!(
            "{} {} {} into {}",
            operation,
            self.config.identity.group_resource(),
            document.key(),
            self.config.index
        );
        let body = serde_json::to_value(&document).map_err(|e| CodecError::Encode {
            message: e.to_string(),
        })?;

        match self.backend.index_document(&self.config.index, &id, body).await {
            Ok(()) => {
                debug!(cluster, id = %id, "{}", context);
                Ok(())
            }
            Err(e) => {
                error!(cluster, id = %id, error = %e, "Failed to {}", context);
                Err(StorageError::backend_call(context, e))
            }
        }
    }

    fn decode_hit(&self, hit: SearchHit) -> StorageResult<C::Object> {
        let document: ResourceDocument =
            serde_json::from_value(hit.source).map_err(CodecError::from)?;
        Ok(self.codec.decode(document.object)?)
    }

    fn key_query(&self, cluster: &str, namespace: &str, name: &str) -> Value {
        let identity = &self.config.identity;
        let exprs = [
            QueryExpression::term("group", identity.group.as_str()),
            QueryExpression::term("version", identity.version.as_str()),
            QueryExpression::term("resource", identity.resource.as_str()),
            QueryExpression::term("name", name),
            QueryExpression::term("namespace", namespace),
            QueryExpression::term(cluster_path(), cluster),
        ];
        let query: BoolQuery = exprs.iter().collect();
        json!({ "size": 2, "query": query.to_value() })
    }
}

#[async_trait]
impl<B, C> ResourceStorage for ResourceStore<B, C>
where
    B: SearchBackend + ?Sized,
    C: ObjectCodec,
{
    type Object = C::Object;

    async fn create(&self, cluster: &str, object: &C::Object) -> StorageResult<()> {
        self.upsert("create", cluster, object).await
    }

    async fn update(&self, cluster: &str, object: &C::Object) -> StorageResult<()> {
        self.upsert("update", cluster, object).await
    }

    async fn get(&self, cluster: &str, namespace: &str, name: &str) -> StorageResult<C::Object> {
        let index = self.config.index.as_str();
        let hits = self
            .backend
            .search(&[index], self.key_query(cluster, namespace, name))
            .await
            .map_err(|e| {
                let context = format!(
                    "get {} {}/{} from {}",
                    self.config.identity.group_resource(),
                    namespace,
                    name,
                    index
                );
                StorageError::backend_call(context, e)
            })?;

        let count = usize::try_from(hits.total).unwrap_or(usize::MAX).max(hits.len());
        match count {
            0 => Err(ResourceError::NotFound {
                group_resource: self.config.identity.group_resource().to_string(),
                cluster: cluster.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            }
            .into()),
            1 => {
                let hit = hits.hits.into_iter().next().ok_or_else(|| {
                    StorageError::backend_call(
                        format!("get {}/{} from {}", namespace, name, index),
                        BackendError::MalformedResponse {
                            backend_name: self.backend.name().to_string(),
                            message: "total is 1 but no hit was returned".to_string(),
                        },
                    )
                })?;
                self.decode_hit(hit)
            }
            count => Err(ResourceError::Duplicate {
                group_resource: self.config.identity.group_resource().to_string(),
                cluster: cluster.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
                count,
            }
            .into()),
        }
    }

    async fn list(&self, opts: &ListOptions) -> StorageResult<ListPage<C::Object>> {
        let owner_ids = if opts.owner_scope().is_some() {
            OwnerResolver::new(&*self.backend, &self.config.alias)
                .resolve_owner_ids(opts)
                .await?
        } else {
            Vec::new()
        };

        let compiled = ListQueryCompiler::new(&self.config.identity)
            .with_storage_name(self.backend.name())
            .compile(&owner_ids, opts)?;
        let offset = compiled.offset();

        let index = self.config.index.as_str();
        let hits = self
            .backend
            .search(&[index], compiled.into_body())
            .await
            .map_err(|e| {
                StorageError::backend_call(
                    format!("list {} in {}", self.config.identity.group_resource(), index),
                    e,
                )
            })?;

        let total = hits.total;
        let items = hits
            .hits
            .into_iter()
            .map(|hit| self.decode_hit(hit))
            .collect::<StorageResult<Vec<_>>>()?;

        Ok(ListPage::from_search(
            items,
            offset,
            opts.page_limit(),
            opts.with_continue,
            total,
        ))
    }

    async fn delete(&self, cluster: &str, object: &C::Object) -> StorageResult<()> {
        let payload = self.codec.encode(object)?;
        let meta = ObjectMeta::new(&payload);
        let uid = meta.uid();
        if uid.is_empty() {
            debug!(
                cluster,
                namespace = meta.namespace(),
                name = meta.name(),
                "Object has no uid, nothing to delete"
            );
            return Ok(());
        }

        let index = self.config.index.as_str();
        self.backend.delete_document(index, uid).await.map_err(|e| {
            StorageError::backend_call(
                format!(
                    "delete {} {}/{} from {}",
                    self.config.identity.group_resource(),
                    meta.namespace(),
                    meta.name(),
                    index
                ),
                e,
            )
        })?;

        debug!(cluster, uid, "Deleted {} document", self.config.identity.group_resource());
        Ok(())
    }
}
