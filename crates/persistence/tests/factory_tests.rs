//! Cluster maintenance operations of the storage factory.

mod common;

use std::sync::Arc;

use common::*;
use kubedex_persistence::backends::memory::MemoryBackend;
use kubedex_persistence::types::{GroupResource, ListOptions};
use kubedex_persistence::{ResourceStorage, StorageConfig, StorageFactory};

async fn seed(factory: &StorageFactory<MemoryBackend>) -> (MemoryStore, MemoryStore) {
    let deployment_store = json_store(factory, deployments()).await;
    let pod_store = json_store(factory, pods()).await;
    for cluster in ["c1", "c2"] {
        deployment_store
            .create(
                cluster,
                &ObjectFixture::new("Deployment", "web")
                    .api_version("apps/v1")
                    .in_namespace("default")
                    .with_uid(format!("{cluster}-dep"))
                    .with_resource_version("100")
                    .build(),
            )
            .await
            .unwrap();
        for (i, name) in ["web-0", "web-1"].iter().enumerate() {
            pod_store
                .create(
                    cluster,
                    &ObjectFixture::pod(name)
                        .with_uid(format!("{cluster}-{name}"))
                        .with_resource_version(&format!("{}", 200 + i))
                        .build(),
                )
                .await
                .unwrap();
        }
    }
    (deployment_store, pod_store)
}

#[tokio::test]
async fn test_clean_cluster_removes_every_kind() {
    let factory = memory_factory();
    let (deployment_store, pod_store) = seed(&factory).await;

    factory.clean_cluster("c1").await.unwrap();

    let c1 = ListOptions::new().with_clusters(["c1"]);
    assert!(deployment_store.list(&c1).await.unwrap().is_empty());
    assert!(pod_store.list(&c1).await.unwrap().is_empty());

    let c2 = ListOptions::new().with_clusters(["c2"]);
    assert_eq!(deployment_store.list(&c2).await.unwrap().len(), 1);
    assert_eq!(pod_store.list(&c2).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_clean_unknown_cluster_is_a_no_op() {
    let factory = memory_factory();
    seed(&factory).await;

    factory.clean_cluster("nope").await.unwrap();
    assert_eq!(factory.backend().document_count("kubedex-core-pods"), 4);
}

#[tokio::test]
async fn test_clean_cluster_resource_removes_one_kind() {
    let factory = memory_factory();
    let (deployment_store, pod_store) = seed(&factory).await;

    factory.clean_cluster_resource("c1", &pods()).await.unwrap();

    let c1 = ListOptions::new().with_clusters(["c1"]);
    assert!(pod_store.list(&c1).await.unwrap().is_empty());
    assert_eq!(deployment_store.list(&c1).await.unwrap().len(), 1);
    assert_eq!(
        pod_store
            .list(&ListOptions::new().with_clusters(["c2"]))
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn test_clean_cluster_resource_without_index() {
    let factory = memory_factory();

    factory
        .clean_cluster_resource("c1", &configmaps())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_get_resource_versions() {
    let factory = memory_factory();
    seed(&factory).await;

    let versions = factory.get_resource_versions("c1").await.unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[&deployments()]["default/web"], "100");

    let pod_versions = &versions[&pods()];
    assert_eq!(pod_versions.len(), 2);
    assert_eq!(pod_versions["default/web-0"], "200");
    assert_eq!(pod_versions["default/web-1"], "201");
}

#[tokio::test]
async fn test_get_resource_versions_of_unknown_cluster() {
    let factory = memory_factory();
    seed(&factory).await;

    assert!(factory.get_resource_versions("nope").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_resource_versions_truncates_at_result_window() {
    let config = StorageConfig {
        max_result_window: 2,
        ..Default::default()
    };
    let factory = StorageFactory::new(Arc::new(MemoryBackend::new()), config).unwrap();
    seed(&factory).await;

    let versions = factory.get_resource_versions("c1").await.unwrap();
    let read: usize = versions.values().map(|v| v.len()).sum();
    assert_eq!(read, 2);
}

#[tokio::test]
async fn test_ensure_resource_index_is_idempotent() {
    let factory = memory_factory();
    let gr = GroupResource::new("apps", "deployments");

    let first = factory.ensure_resource_index(&gr).await.unwrap();
    let second = factory.ensure_resource_index(&gr).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(factory.backend().indices(), vec![first]);
}
