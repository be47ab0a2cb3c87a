//! Command line configuration for the Kubedex CLI.
//!
//! Every connection option can also be set through the environment.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `KUBEDEX_ES_NODES` | http://localhost:9200 | Elasticsearch nodes (comma-separated) |
//! | `KUBEDEX_ES_USERNAME` | - | Basic auth username |
//! | `KUBEDEX_ES_PASSWORD` | - | Basic auth password |
//! | `KUBEDEX_ES_INSECURE` | false | Skip TLS certificate validation |
//! | `KUBEDEX_INDEX_PREFIX` | kubedex | Prefix of per-kind index names |
//! | `KUBEDEX_RESOURCE_ALIAS` | kubedex_resource | Alias spanning all kind indices |
//! | `KUBEDEX_REQUEST_TIMEOUT` | 30000 | Request timeout (milliseconds) |
//! | `KUBEDEX_LOG_LEVEL` | info | Log level |

use clap::{Args, Parser, Subcommand};
use kubedex_persistence::StorageConfig;
use kubedex_persistence::config::StorageAuth;
use kubedex_persistence::types::GroupVersionResource;

/// Kubedex operator CLI.
#[derive(Debug, Clone, Parser)]
#[command(name = "kubedex")]
#[command(about = "Bootstrap, inspect and clean the Kubedex resource index")]
pub struct CliConfig {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, env = "KUBEDEX_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Backend connection and index naming options.
#[derive(Debug, Clone, Args)]
pub struct ConnectionArgs {
    /// Elasticsearch node URLs (comma-separated); only the first is used.
    #[arg(
        long,
        global = true,
        env = "KUBEDEX_ES_NODES",
        default_value = "http://localhost:9200"
    )]
    pub nodes: String,

    /// Basic auth username.
    #[arg(long, global = true, env = "KUBEDEX_ES_USERNAME")]
    pub username: Option<String>,

    /// Basic auth password.
    #[arg(long, global = true, env = "KUBEDEX_ES_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Skip TLS certificate validation.
    #[arg(long, global = true, env = "KUBEDEX_ES_INSECURE", default_value = "false")]
    pub insecure: bool,

    /// Prefix of per-kind index names.
    #[arg(long, global = true, env = "KUBEDEX_INDEX_PREFIX", default_value = "kubedex")]
    pub index_prefix: String,

    /// Alias attached to every kind index.
    #[arg(
        long,
        global = true,
        env = "KUBEDEX_RESOURCE_ALIAS",
        default_value = "kubedex_resource"
    )]
    pub resource_alias: String,

    /// Request timeout in milliseconds.
    #[arg(
        long,
        global = true,
        env = "KUBEDEX_REQUEST_TIMEOUT",
        default_value = "30000"
    )]
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create the indices of the given kinds if they do not exist.
    Bootstrap {
        /// Kinds as `group/version/resource`, or `version/resource` for the core group.
        #[arg(required = true, value_parser = parse_gvr)]
        resources: Vec<GroupVersionResource>,
    },

    /// Delete every stored object of a cluster.
    CleanCluster {
        cluster: String,
    },

    /// Delete the stored objects of one kind of one cluster.
    CleanResource {
        cluster: String,
        #[arg(value_parser = parse_gvr)]
        resource: GroupVersionResource,
    },

    /// Print the stored resource versions of a cluster as JSON.
    ResourceVersions {
        cluster: String,
    },

    /// List stored objects of one kind as JSON.
    List(ListArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    #[arg(value_parser = parse_gvr)]
    pub resource: GroupVersionResource,

    /// Restrict to these clusters.
    #[arg(long = "cluster", short = 'c')]
    pub clusters: Vec<String>,

    /// Restrict to these namespaces.
    #[arg(long = "namespace", short = 'n')]
    pub namespaces: Vec<String>,

    /// Label selector, e.g. `tier=front,env notin (dev)`.
    #[arg(long, short = 'l')]
    pub selector: Option<String>,

    /// Field selector, e.g. `status.phase=Running`.
    #[arg(long)]
    pub field_selector: Option<String>,

    /// Page size.
    #[arg(long)]
    pub limit: Option<u32>,

    /// Continue token returned by a previous page.
    #[arg(long = "continue")]
    pub continue_token: Option<String>,
}

impl CliConfig {
    /// Validates the configuration, returning every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.connection.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.connection.username.is_some() != self.connection.password.is_some() {
            errors.push("Username and password must be given together".to_string());
        }

        if let Err(e) = self.storage_config().validate() {
            errors.push(e.to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Builds the storage configuration from the connection options.
    pub fn storage_config(&self) -> StorageConfig {
        let conn = &self.connection;
        let auth = match (&conn.username, &conn.password) {
            (Some(username), Some(password)) => Some(StorageAuth::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        };

        StorageConfig {
            nodes: conn
                .nodes
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            index_prefix: conn.index_prefix.clone(),
            resource_alias: conn.resource_alias.clone(),
            request_timeout_ms: conn.request_timeout,
            auth,
            disable_certificate_validation: conn.insecure,
            ..Default::default()
        }
    }
}

/// Parses `group/version/resource`, or `version/resource` for the core group.
pub fn parse_gvr(input: &str) -> Result<GroupVersionResource, String> {
    let parts: Vec<&str> = input.trim().split('/').collect();
    let gvr = match parts.as_slice() {
        [version, resource] => GroupVersionResource::new("", *version, *resource),
        [group, version, resource] => GroupVersionResource::new(*group, *version, *resource),
        _ => {
            return Err(format!(
                "expected group/version/resource or version/resource, got {:?}",
                input
            ));
        }
    };
    if gvr.version.is_empty() || gvr.resource.is_empty() {
        return Err(format!("version and resource are required in {:?}", input));
    }
    Ok(gvr)
}
