//! Resource identity and document types.
//!
//! This module defines the identity of a resource kind ([`GroupResource`],
//! [`GroupVersionResource`]) and the [`ResourceDocument`] that is persisted in
//! the search backend for every origin object.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Annotation recording the origin cluster of a stored object.
pub const CLUSTER_NAME_ANNOTATION: &str = "shadow.clusterpedia.io/cluster-name";

/// A resource kind without version, e.g. `deployments.apps`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GroupResource {
    /// API group; empty for the core group.
    pub group: String,
    /// Plural resource name.
    pub resource: String,
}

impl GroupResource {
    /// Creates a new group/resource pair.
    pub fn new(group: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            resource: resource.into(),
        }
    }

    /// Returns true when neither group nor resource is set.
    pub fn is_empty(&self) -> bool {
        self.group.is_empty() && self.resource.is_empty()
    }
}

impl fmt::Display for GroupResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.resource)
        } else {
            write!(f, "{}.{}", self.resource, self.group)
        }
    }
}

/// A fully qualified resource kind, e.g. `apps/v1 deployments`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GroupVersionResource {
    /// Creates a new group/version/resource triple.
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            resource: resource.into(),
        }
    }

    /// Drops the version.
    pub fn group_resource(&self) -> GroupResource {
        GroupResource::new(&self.group, &self.resource)
    }

    /// Returns `group/version`, or just `version` for the core group.
    pub fn group_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for GroupVersionResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Resource={}", self.group_version(), self.resource)
    }
}

/// The document persisted in the search backend for one origin object.
///
/// The identity fields are duplicated at the top level as exact-match keywords;
/// `object` keeps the full payload so it can be decoded back by a codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDocument {
    pub group: String,
    pub version: String,
    pub resource: String,
    #[serde(default)]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub resource_version: String,
    pub object: Value,
}

impl ResourceDocument {
    /// Builds a document for `object`, stored under the kind `gvr`.
    pub fn new(gvr: &GroupVersionResource, object: Value) -> Self {
        let meta = ObjectMeta::new(&object);
        Self {
            group: gvr.group.clone(),
            version: gvr.version.clone(),
            resource: gvr.resource.clone(),
            kind: meta.kind().to_string(),
            name: meta.name().to_string(),
            namespace: meta.namespace().to_string(),
            resource_version: meta.resource_version().to_string(),
            object,
        }
    }

    /// Returns the kind this document is stored under.
    pub fn group_version_resource(&self) -> GroupVersionResource {
        GroupVersionResource::new(&self.group, &self.version, &self.resource)
    }

    /// Returns `namespace/name`, or `name` for cluster-scoped objects.
    pub fn key(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.namespace, self.name)
        }
    }
}

/// Read-only accessor over the `metadata` of a dynamic object.
#[derive(Debug, Clone, Copy)]
pub struct ObjectMeta<'a> {
    object: &'a Value,
}

impl<'a> ObjectMeta<'a> {
    pub fn new(object: &'a Value) -> Self {
        Self { object }
    }

    fn metadata_str(&self, field: &str) -> &'a str {
        self.object
            .get("metadata")
            .and_then(|m| m.get(field))
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn kind(&self) -> &'a str {
        self.object.get("kind").and_then(Value::as_str).unwrap_or("")
    }

    pub fn api_version(&self) -> &'a str {
        self.object
            .get("apiVersion")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn name(&self) -> &'a str {
        self.metadata_str("name")
    }

    pub fn namespace(&self) -> &'a str {
        self.metadata_str("namespace")
    }

    pub fn uid(&self) -> &'a str {
        self.metadata_str("uid")
    }

    pub fn resource_version(&self) -> &'a str {
        self.metadata_str("resourceVersion")
    }

    /// Returns the value of an annotation, if set.
    pub fn annotation(&self, key: &str) -> Option<&'a str> {
        self.object
            .get("metadata")
            .and_then(|m| m.get("annotations"))
            .and_then(|a| a.get(key))
            .and_then(Value::as_str)
    }

    /// Returns the UIDs of all owner references.
    pub fn owner_uids(&self) -> Vec<&'a str> {
        self.object
            .get("metadata")
            .and_then(|m| m.get("ownerReferences"))
            .and_then(Value::as_array)
            .map(|refs| {
                refs.iter()
                    .filter_map(|r| r.get("uid").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Sets `metadata.annotations[CLUSTER_NAME_ANNOTATION]` to `cluster`.
///
/// A different existing value is replaced so the object stays reachable under
/// the cluster it is written for. Non-object payloads are left untouched.
pub fn stamp_cluster(object: &mut Value, cluster: &str) {
    let Some(obj) = object.as_object_mut() else {
        return;
    };
    let metadata = obj
        .entry("metadata")
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(metadata) = metadata.as_object_mut() else {
        return;
    };
    let annotations = metadata
        .entry("annotations")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Some(annotations) = annotations.as_object_mut() {
        let previous = annotations.insert(
            CLUSTER_NAME_ANNOTATION.to_string(),
            Value::String(cluster.to_string()),
        );
        match previous {
            Some(Value::String(previous)) if previous != cluster => {
                warn!(
                    annotated = %previous,
                    cluster, "Replacing cluster annotation with the write cluster"
                );
            }
            _ => {}
        }
    }
}
