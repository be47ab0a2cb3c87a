//! Owner-descendant resolution.
//!
//! Objects reference their owners through `metadata.ownerReferences[].uid`.
//! Resolving "descendants of seniority N" walks that graph N hops down from a
//! root set, one search per hop, across every kind behind the shared alias.

use serde_json::{Value, json};
use tracing::debug;

use crate::core::SearchBackend;
use crate::error::{StorageError, StorageResult};
use crate::query::compiler::{OWNER_UID_PATH, UID_PATH};
use crate::query::{BoolQuery, QueryExpression, cluster_path};
use crate::types::{ListOptions, ObjectMeta};

/// Maximum number of hits read per resolution round.
pub const OWNER_SEARCH_SIZE: u32 = 500;

/// Resolves owner filters against the shared alias.
#[derive(Debug)]
pub struct OwnerResolver<'a, B: ?Sized> {
    backend: &'a B,
    alias: &'a str,
}

impl<'a, B: SearchBackend + ?Sized> OwnerResolver<'a, B> {
    pub fn new(backend: &'a B, alias: &'a str) -> Self {
        Self { backend, alias }
    }

    /// Returns the owner id set for `opts`, empty when no owner filter applies.
    pub async fn resolve_owner_ids(&self, opts: &ListOptions) -> StorageResult<Vec<String>> {
        let [cluster] = opts.cluster_names.as_slice() else {
            return Ok(Vec::new());
        };
        if let Some(uid) = opts.owner_uid.as_deref().filter(|s| !s.is_empty()) {
            return self
                .resolve_descendants(cluster, vec![uid.to_string()], opts.owner_seniority)
                .await;
        }
        if let Some(name) = opts.owner_name.as_deref().filter(|s| !s.is_empty()) {
            let roots = self.lookup_by_name(cluster, name, opts).await?;
            return self
                .resolve_descendants(cluster, roots, opts.owner_seniority)
                .await;
        }
        Ok(Vec::new())
    }

    /// Walks `seniority` hops down from `roots`.
    ///
    /// Each round reads at most [`OWNER_SEARCH_SIZE`] hits. Hits without a UID
    /// are skipped and the result keeps first-seen order without duplicates.
    pub async fn resolve_descendants(
        &self,
        cluster: &str,
        roots: Vec<String>,
        seniority: u32,
    ) -> StorageResult<Vec<String>> {
        let mut current = roots;
        for round in 1..=seniority {
            if current.is_empty() {
                debug!(cluster, round, "Owner resolution reached an empty generation");
                break;
            }
            let query = json!({
                "size": OWNER_SEARCH_SIZE,
                "_source": [UID_PATH],
                "query": {
                    "bool": {
                        "must": [
                            {"terms": {OWNER_UID_PATH: current}},
                            {"term": {cluster_path(): cluster}}
                        ]
                    }
                }
            });
            current = self.search_uids(query, "resolve owner descendants").await?;
            debug!(cluster, round, found = current.len(), "Resolved owner generation");
        }
        Ok(current)
    }

    async fn lookup_by_name(
        &self,
        cluster: &str,
        name: &str,
        opts: &ListOptions,
    ) -> StorageResult<Vec<String>> {
        let mut exprs = Vec::new();
        if !opts.namespaces.is_empty() {
            exprs.push(QueryExpression::terms("namespace", opts.namespaces.iter().cloned()));
        }
        if let Some(gr) = opts.owner_group_resource.as_ref().filter(|gr| !gr.is_empty()) {
            exprs.push(QueryExpression::term("group", gr.group.as_str()));
            exprs.push(QueryExpression::term("resource", gr.resource.as_str()));
        }
        exprs.push(QueryExpression::term("name", name));
        exprs.push(QueryExpression::term(cluster_path(), cluster));

        let bool_query: BoolQuery = exprs.iter().collect();
        let query = json!({
            "size": OWNER_SEARCH_SIZE,
            "_source": [UID_PATH],
            "query": bool_query.to_value(),
        });
        self.search_uids(query, "look up owner by name").await
    }

    async fn search_uids(&self, query: Value, operation: &str) -> StorageResult<Vec<String>> {
        let hits = self
            .backend
            .search(&[self.alias], query)
            .await
            .map_err(|e| StorageError::backend_call(format!("{operation} in {}", self.alias), e))?;

        let mut uids: Vec<String> = Vec::with_capacity(hits.len());
        for hit in &hits.hits {
            let Some(object) = hit.source.get("object") else {
                continue;
            };
            let uid = ObjectMeta::new(object).uid();
            if uid.is_empty() || uids.iter().any(|u| u == uid) {
                continue;
            }
            uids.push(uid.to_string());
        }
        Ok(uids)
    }
}
