//! Test fixtures for persistence layer testing.
//!
//! Provides a builder for Kubernetes-style objects and the resource kinds the
//! integration tests store.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use kubedex_persistence::types::GroupVersionResource;

pub fn deployments() -> GroupVersionResource {
    GroupVersionResource::new("apps", "v1", "deployments")
}

pub fn replicasets() -> GroupVersionResource {
    GroupVersionResource::new("apps", "v1", "replicasets")
}

pub fn pods() -> GroupVersionResource {
    GroupVersionResource::new("", "v1", "pods")
}

pub fn configmaps() -> GroupVersionResource {
    GroupVersionResource::new("", "v1", "configmaps")
}

/// An object fixture for testing.
#[derive(Debug, Clone)]
pub struct ObjectFixture {
    api_version: String,
    kind: String,
    name: String,
    namespace: Option<String>,
    uid: Option<String>,
    resource_version: Option<String>,
    labels: BTreeMap<String, String>,
    annotations: BTreeMap<String, String>,
    owners: Vec<String>,
    creation_timestamp: Option<String>,
    extra: Map<String, Value>,
}

impl ObjectFixture {
    /// Creates a new object fixture with minimal required fields.
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: kind.into(),
            name: name.into(),
            namespace: None,
            uid: None,
            resource_version: None,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            owners: Vec::new(),
            creation_timestamp: None,
            extra: Map::new(),
        }
    }

    pub fn pod(name: &str) -> Self {
        Self::new("Pod", name).in_namespace("default").with_uid(format!("pod-{name}"))
    }

    pub fn api_version(mut self, api_version: &str) -> Self {
        self.api_version = api_version.to_string();
        self
    }

    pub fn in_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn without_uid(mut self) -> Self {
        self.uid = None;
        self
    }

    pub fn with_resource_version(mut self, rv: &str) -> Self {
        self.resource_version = Some(rv.to_string());
        self
    }

    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_annotation(mut self, key: &str, value: &str) -> Self {
        self.annotations.insert(key.to_string(), value.to_string());
        self
    }

    pub fn owned_by(mut self, uid: &str) -> Self {
        self.owners.push(uid.to_string());
        self
    }

    pub fn created_at(mut self, timestamp: &str) -> Self {
        self.creation_timestamp = Some(timestamp.to_string());
        self
    }

    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    /// Builds the object payload.
    pub fn build(&self) -> Value {
        let mut metadata = Map::new();
        metadata.insert("name".to_string(), json!(self.name));
        if let Some(ns) = &self.namespace {
            metadata.insert("namespace".to_string(), json!(ns));
        }
        if let Some(uid) = &self.uid {
            metadata.insert("uid".to_string(), json!(uid));
        }
        if let Some(rv) = &self.resource_version {
            metadata.insert("resourceVersion".to_string(), json!(rv));
        }
        if !self.labels.is_empty() {
            metadata.insert("labels".to_string(), json!(self.labels));
        }
        if !self.annotations.is_empty() {
            metadata.insert("annotations".to_string(), json!(self.annotations));
        }
        if !self.owners.is_empty() {
            let refs: Vec<Value> = self
                .owners
                .iter()
                .map(|uid| json!({"apiVersion": "apps/v1", "kind": "ReplicaSet", "name": uid, "uid": uid}))
                .collect();
            metadata.insert("ownerReferences".to_string(), Value::Array(refs));
        }
        if let Some(ts) = &self.creation_timestamp {
            metadata.insert("creationTimestamp".to_string(), json!(ts));
        }

        let mut object = Map::new();
        object.insert("apiVersion".to_string(), json!(self.api_version));
        object.insert("kind".to_string(), json!(self.kind));
        object.insert("metadata".to_string(), Value::Object(metadata));
        for (key, value) in &self.extra {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }
}
