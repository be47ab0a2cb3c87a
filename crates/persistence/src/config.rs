//! Storage configuration.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Authentication for the search backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageAuth {
    /// Basic username/password authentication.
    Basic {
        username: String,
        password: String,
    },
    /// Bearer token authentication.
    Bearer { token: String },
}

/// How `object.metadata.creationTimestamp` is mapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimestampMapping {
    /// A `date` field; range queries on creation time work.
    Date {
        #[serde(default = "default_timestamp_format")]
        format: String,
    },
    /// A plain `text` field; creation-time range queries match nothing.
    Text,
}

impl Default for TimestampMapping {
    fn default() -> Self {
        TimestampMapping::Date {
            format: default_timestamp_format(),
        }
    }
}

/// Configuration shared by the storage factory and the Elasticsearch backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Elasticsearch node URLs (e.g., `["http://localhost:9200"]`).
    /// Only the first node is used (single-node connection pool).
    pub nodes: Vec<String>,

    /// Index name prefix (default: `"kubedex"`).
    /// Indices are named: `{prefix}-{group|core}-{resource}`
    #[serde(default = "default_index_prefix")]
    pub index_prefix: String,

    /// Alias attached to every resource index (default: `"kubedex_resource"`).
    #[serde(default = "default_resource_alias")]
    pub resource_alias: String,

    /// Number of primary shards per index (default: 1).
    #[serde(default = "default_shards")]
    pub number_of_shards: u32,

    /// Number of replica shards per index (default: 0).
    #[serde(default = "default_replicas")]
    pub number_of_replicas: u32,

    /// Replica auto-expansion range (default: `"0-1"`).
    #[serde(default = "default_auto_expand_replicas")]
    pub auto_expand_replicas: String,

    #[serde(default)]
    pub timestamp_mapping: TimestampMapping,

    /// Request timeout in milliseconds (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Upper bound on hits read by inventory searches (default: 10000).
    #[serde(default = "default_max_result_window")]
    pub max_result_window: u32,

    /// Optional authentication.
    #[serde(default)]
    pub auth: Option<StorageAuth>,

    /// Whether to disable certificate validation (default: false).
    /// Only use for development/testing.
    #[serde(default)]
    pub disable_certificate_validation: bool,
}

fn default_index_prefix() -> String {
    "kubedex".to_string()
}

fn default_resource_alias() -> String {
    "kubedex_resource".to_string()
}

fn default_shards() -> u32 {
    1
}

fn default_replicas() -> u32 {
    0
}

fn default_auto_expand_replicas() -> String {
    "0-1".to_string()
}

fn default_timestamp_format() -> String {
    "yyyy-MM-dd'T'HH:mm:ss'Z'".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30000
}

fn default_max_result_window() -> u32 {
    10000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            nodes: vec!["http://localhost:9200".to_string()],
            index_prefix: default_index_prefix(),
            resource_alias: default_resource_alias(),
            number_of_shards: default_shards(),
            number_of_replicas: default_replicas(),
            auto_expand_replicas: default_auto_expand_replicas(),
            timestamp_mapping: TimestampMapping::default(),
            request_timeout_ms: default_request_timeout_ms(),
            max_result_window: default_max_result_window(),
            auth: None,
            disable_certificate_validation: false,
        }
    }
}

impl StorageConfig {
    /// Checks the settings index and alias names depend on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.nodes.iter().all(|n| n.trim().is_empty()) {
            return Err(ValidationError::InvalidConfig {
                message: "at least one node URL is required".to_string(),
            });
        }
        if self.index_prefix.trim().is_empty() {
            return Err(ValidationError::InvalidConfig {
                message: "index_prefix must not be empty".to_string(),
            });
        }
        if self.resource_alias.trim().is_empty() {
            return Err(ValidationError::InvalidConfig {
                message: "resource_alias must not be empty".to_string(),
            });
        }
        if self.resource_alias.starts_with(&format!("{}-", self.index_prefix)) {
            return Err(ValidationError::InvalidConfig {
                message: format!(
                    "resource_alias {:?} collides with index names under prefix {:?}",
                    self.resource_alias, self.index_prefix
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.index_prefix, "kubedex");
        assert_eq!(config.resource_alias, "kubedex_resource");
        assert_eq!(config.number_of_shards, 1);
        assert_eq!(config.number_of_replicas, 0);
        assert_eq!(config.auto_expand_replicas, "0-1");
        assert_eq!(config.nodes, vec!["http://localhost:9200"]);
        assert_eq!(
            config.timestamp_mapping,
            TimestampMapping::Date {
                format: "yyyy-MM-dd'T'HH:mm:ss'Z'".to_string()
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: StorageConfig = serde_json::from_str(
            r#"{
                "nodes": ["https://es.internal:9200"],
                "index_prefix": "shadow",
                "timestamp_mapping": {"type": "text"},
                "auth": {"basic": {"username": "elastic", "password": "changeme"}}
            }"#,
        )
        .unwrap();
        assert_eq!(config.index_prefix, "shadow");
        assert_eq!(config.resource_alias, "kubedex_resource");
        assert_eq!(config.request_timeout_ms, 30000);
        assert_eq!(config.timestamp_mapping, TimestampMapping::Text);
        assert!(matches!(config.auth, Some(StorageAuth::Basic { .. })));
    }

    #[test]
    fn test_serde_round_trip() {
        let config = StorageConfig {
            auth: Some(StorageAuth::Bearer {
                token: "t0k3n".to_string(),
            }),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: StorageConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_validate_rejects_empty_values() {
        let config = StorageConfig {
            nodes: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = StorageConfig {
            index_prefix: " ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = StorageConfig {
            resource_alias: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = StorageConfig {
            resource_alias: "kubedex-all".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
