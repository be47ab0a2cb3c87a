//! Elasticsearch index schema and mapping definitions.
//!
//! Every resource kind gets its own index. The identity fields are exact-match
//! keywords, metadata maps are `flattened`, and bulky payload sections are kept
//! in `_source` without being indexed.

use serde_json::{Map, Value, json};

use crate::config::{StorageConfig, TimestampMapping};
use crate::core::SearchBackend;
use crate::error::{StorageError, StorageResult};
use crate::types::GroupResource;

/// Creates the index body (aliases, settings, mappings) for a resource kind.
///
/// The mapping includes:
/// - top-level identity fields (`group`, `version`, `resource`, `kind`, ...) as keywords
/// - `object.metadata` name/namespace/resourceVersion as text with a keyword sub-field
/// - labels, annotations and ownerReferences as `flattened`
/// - payload sections that are stored but not indexed, chosen per kind
pub fn create_index_mapping(config: &StorageConfig, group_resource: &GroupResource) -> Value {
    let text_with_keyword = json!({
        "type": "text",
        "fields": {
            "keyword": { "type": "keyword", "ignore_above": 256 }
        }
    });

    let (creation_timestamp, deletion_timestamp) = match &config.timestamp_mapping {
        TimestampMapping::Date { format } => (
            json!({ "type": "date", "format": format }),
            json!({ "type": "keyword" }),
        ),
        TimestampMapping::Text => (json!({ "type": "text" }), json!({ "type": "text" })),
    };

    let mut object_properties = Map::new();
    object_properties.insert(
        "metadata".to_string(),
        json!({
            "properties": {
                "name": text_with_keyword,
                "namespace": text_with_keyword,
                "resourceVersion": text_with_keyword,
                "labels": { "type": "flattened" },
                "annotations": { "type": "flattened" },
                "ownerReferences": { "type": "flattened" },
                "creationTimestamp": creation_timestamp,
                "deletionTimestamp": deletion_timestamp
            }
        }),
    );
    for field in unindexed_payload_fields(group_resource) {
        object_properties.insert(
            field.to_string(),
            json!({ "type": "object", "enabled": false }),
        );
    }

    json!({
        "aliases": {
            config.resource_alias.as_str(): {}
        },
        "settings": {
            "index": {
                "number_of_shards": config.number_of_shards,
                "number_of_replicas": config.number_of_replicas,
                "auto_expand_replicas": config.auto_expand_replicas
            }
        },
        "mappings": {
            "properties": {
                "group": { "type": "keyword" },
                "version": { "type": "keyword" },
                "resource": { "type": "keyword" },
                "kind": { "type": "keyword" },
                "name": { "type": "keyword" },
                "namespace": { "type": "keyword" },
                "resource_version": { "type": "keyword" },
                "object": { "properties": object_properties }
            }
        }
    })
}

/// Payload sections stored in `_source` only.
fn unindexed_payload_fields(group_resource: &GroupResource) -> &'static [&'static str] {
    match (group_resource.group.as_str(), group_resource.resource.as_str()) {
        ("", "configmaps") => &["data", "binaryData"],
        ("", "secrets") => &["data", "stringData"],
        _ => &["spec", "status"],
    }
}

/// Ensures `index` exists, creating it with `mapping` if necessary.
///
/// Concurrent creation is tolerated: the backend treats "already exists" as
/// success.
pub async fn ensure_index<B: SearchBackend + ?Sized>(
    backend: &B,
    index: &str,
    mapping: Value,
) -> StorageResult<()> {
    let exists = backend
        .index_exists(index)
        .await
        .map_err(|e| StorageError::backend_call(format!("check index {}", index), e))?;
    if exists {
        return Ok(());
    }

    backend
        .create_index(index, mapping)
        .await
        .map_err(|e| StorageError::backend_call(format!("create index {}", index), e))?;

    tracing::info!("Created {} index '{}'", backend.name(), index);
    Ok(())
}
