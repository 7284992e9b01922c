// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::naming::cluster_job_name;
use crate::spec::build_labels;
use k8s_openapi::api::batch::v1::Job as ClusterJob;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use xci_adapters::{ClusterCall, FakeClusterAdapter};
use xci_core::test_support::epoch;
use xci_core::{FakeClock, NewBuild};
use xci_storage::MemoryStore;

fn labeled_job(build_id: BuildId, job: &str) -> ClusterJob {
    ClusterJob {
        metadata: ObjectMeta {
            name: Some(cluster_job_name(build_id, job)),
            labels: Some(build_labels(build_id)),
            ..Default::default()
        },
        ..Default::default()
    }
}

async fn running_build(store: &MemoryStore) -> BuildId {
    let build = store
        .create_build(NewBuild::new(1, "ci"), epoch(0))
        .await
        .unwrap();
    store.mark_build_started(build.id, epoch(1)).await.unwrap();
    build.id
}

#[tokio::test]
async fn deletes_build_jobs_and_marks_cancelled() {
    let store = MemoryStore::new();
    let clock = FakeClock::at(epoch(50));
    let build_id = running_build(&store).await;
    let cluster = FakeClusterAdapter::new();
    cluster.insert_job(labeled_job(build_id, "a"));
    cluster.insert_job(labeled_job(build_id, "b"));
    cluster.insert_job(labeled_job(BuildId::new(99), "a"));

    let outcome = cancel_build(&store, &cluster, &clock, build_id)
        .await
        .unwrap();
    assert!(outcome.cancelled);
    assert_eq!(outcome.status, BuildStatus::Cancelled);
    assert_eq!(outcome.deleted, vec!["build-1-a", "build-1-b"]);
    assert_eq!(cluster.job_names(), vec!["build-99-a"]);

    let build = store.get_build(build_id).await.unwrap().unwrap();
    assert_eq!(build.status, BuildStatus::Cancelled);
    assert_eq!(build.finished_at, Some(epoch(50)));
}

#[tokio::test]
async fn finished_build_is_left_alone() {
    let store = MemoryStore::new();
    let clock = FakeClock::at(epoch(50));
    let build_id = running_build(&store).await;
    store
        .set_build_status(build_id, BuildStatus::Succeeded, Some(epoch(10)))
        .await
        .unwrap();
    let cluster = FakeClusterAdapter::new();
    cluster.insert_job(labeled_job(build_id, "a"));

    let outcome = cancel_build(&store, &cluster, &clock, build_id)
        .await
        .unwrap();
    assert!(!outcome.cancelled);
    assert_eq!(outcome.status, BuildStatus::Succeeded);
    assert!(cluster.calls().is_empty());
    let build = store.get_build(build_id).await.unwrap().unwrap();
    assert_eq!(build.finished_at, Some(epoch(10)));
}

#[tokio::test]
async fn build_without_cluster_jobs_is_still_cancelled() {
    let store = MemoryStore::new();
    let build_id = running_build(&store).await;
    let cluster = FakeClusterAdapter::new();

    let outcome = cancel_build(&store, &cluster, &FakeClock::at(epoch(5)), build_id)
        .await
        .unwrap();
    assert!(outcome.cancelled);
    assert!(outcome.deleted.is_empty());
    assert_eq!(
        cluster.calls(),
        vec![ClusterCall::ListJobs {
            selector: "xcoding.io/build-id=1".to_string()
        }]
    );
}

#[tokio::test]
async fn cluster_list_failure_still_cancels_build() {
    let store = MemoryStore::new();
    let build_id = running_build(&store).await;
    let cluster = FakeClusterAdapter::new();
    cluster.insert_job(labeled_job(build_id, "a"));
    cluster.fail_list_jobs("connection refused");

    let outcome = cancel_build(&store, &cluster, &FakeClock::at(epoch(8)), build_id)
        .await
        .unwrap();
    assert!(outcome.cancelled);
    assert_eq!(outcome.status, BuildStatus::Cancelled);
    assert!(outcome.deleted.is_empty());

    let build = store.get_build(build_id).await.unwrap().unwrap();
    assert_eq!(build.status, BuildStatus::Cancelled);
    assert_eq!(build.finished_at, Some(epoch(8)));
}

#[tokio::test]
async fn unknown_build_is_an_error() {
    let store = MemoryStore::new();
    let cluster = FakeClusterAdapter::new();
    let err = cancel_build(&store, &cluster, &FakeClock::new(), BuildId::new(7))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::BuildNotFound(id) if id == BuildId::new(7)));
}
