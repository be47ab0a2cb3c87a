//! Kubedex operator CLI
//!
//! Bootstraps per-kind indices, cleans clusters out of the index, prints the
//! stored resource-version inventory and lists stored objects.

mod config;

use clap::Parser;
use tracing::info;

use config::CliConfig;

/// Initializes logging with the given default level.
///
/// `RUST_LOG` overrides the default filter.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("kubedex={},kubedex_persistence={}", level, level))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        nodes = %config.connection.nodes,
        index_prefix = %config.connection.index_prefix,
        resource_alias = %config.connection.resource_alias,
        "Starting kubedex"
    );

    run(config).await
}

#[cfg(feature = "elasticsearch")]
async fn run(config: CliConfig) -> anyhow::Result<()> {
    use std::sync::Arc;

    use kubedex_persistence::backends::elasticsearch::ElasticsearchBackend;
    use kubedex_persistence::types::{FieldSelector, LabelSelector, ListOptions};
    use kubedex_persistence::{JsonCodec, ResourceStorage, StorageFactory};
    use serde_json::{Map, Value, json};

    use crate::config::Command;

    let storage_config = config.storage_config();
    let backend = Arc::new(ElasticsearchBackend::new(storage_config.clone())?);
    let factory = StorageFactory::new(backend, storage_config)?;

    match config.command {
        Command::Bootstrap { resources } => {
            for gvr in resources {
                let index = factory.ensure_resource_index(&gvr.group_resource()).await?;
                println!("{} -> {}", gvr.group_resource(), index);
            }
        }
        Command::CleanCluster { cluster } => {
            factory.clean_cluster(&cluster).await?;
            println!("cleaned cluster {}", cluster);
        }
        Command::CleanResource { cluster, resource } => {
            factory.clean_cluster_resource(&cluster, &resource).await?;
            println!("cleaned {} of cluster {}", resource.group_resource(), cluster);
        }
        Command::ResourceVersions { cluster } => {
            let versions = factory.get_resource_versions(&cluster).await?;
            let mut out = Map::new();
            for (gvr, objects) in versions {
                let key = format!("{}/{}", gvr.group_version(), gvr.resource);
                out.insert(key, json!(objects));
            }
            println!("{}", serde_json::to_string_pretty(&Value::Object(out))?);
        }
        Command::List(args) => {
            let store = factory
                .new_resource_storage(args.resource, JsonCodec)
                .await?;

            let mut opts = ListOptions::new()
                .with_clusters(args.clusters)
                .with_namespaces(args.namespaces);
            if let Some(selector) = args.selector.as_deref() {
                opts = opts.with_label_selector(LabelSelector::parse(selector)?);
            }
            if let Some(selector) = args.field_selector.as_deref() {
                opts = opts.with_field_selector(FieldSelector::parse(selector)?);
            }
            opts.limit = args.limit;
            opts.continue_token = args.continue_token;

            let page = store.list(&opts).await?;
            let out = json!({
                "items": page.items,
                "continue": page.continue_token,
                "remainingItemCount": page.remaining_item_count,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }

    Ok(())
}

/// Fallback when the elasticsearch feature is not enabled.
#[cfg(not(feature = "elasticsearch"))]
async fn run(_config: CliConfig) -> anyhow::Result<()> {
    anyhow::bail!(
        "kubedex requires the 'elasticsearch' feature. \
         Build with: cargo build -p kubedex --features elasticsearch"
    )
}
