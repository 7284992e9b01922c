// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::naming::cluster_job_name;
use crate::spec::build_labels;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use xci_adapters::{FakeClusterAdapter, JobPlan};

async fn submit(cluster: &FakeClusterAdapter, build: u64, job: &str) {
    let build_id = BuildId::new(build);
    let spec = ClusterJob {
        metadata: ObjectMeta {
            name: Some(cluster_job_name(build_id, job)),
            labels: Some(build_labels(build_id)),
            ..Default::default()
        },
        ..Default::default()
    };
    cluster.submit_job(&spec).await.unwrap();
}

fn names(page: &StatusPage) -> Vec<&str> {
    page.jobs.iter().map(|j| j.job_name.as_str()).collect()
}

#[tokio::test]
async fn reports_jobs_of_one_build_with_pods() {
    let cluster = FakeClusterAdapter::new()
        .with_plan("build-3-deploy", JobPlan::failed(Vec::<String>::new()))
        .with_plan("build-3-e2e", JobPlan::unschedulable("no gpu nodes"));
    for job in ["lint", "deploy", "e2e"] {
        submit(&cluster, 3, job).await;
    }
    submit(&cluster, 4, "lint").await;

    let page = build_status(&cluster, BuildId::new(3), &StatusQuery::default())
        .await
        .unwrap();
    assert_eq!(
        names(&page),
        vec!["build-3-deploy", "build-3-e2e", "build-3-lint"]
    );
    assert_eq!(
        (page.page, page.page_size, page.total_items, page.total_pages),
        (1, 20, 3, 1)
    );

    let deploy = &page.jobs[0];
    assert_eq!((deploy.succeeded, deploy.failed), (0, 1));

    let lint = &page.jobs[2];
    assert_eq!((lint.succeeded, lint.failed), (1, 0));
    assert_eq!(
        lint.pods,
        vec![PodInfo {
            name: "build-3-lint-pod".to_string(),
            phase: "Running".to_string(),
            node: "fake-node".to_string(),
            reason: String::new(),
        }]
    );

    let e2e = &page.jobs[1];
    assert_eq!(e2e.pods[0].phase, "Pending");
    assert_eq!(e2e.pods[0].node, "");
    assert_eq!(e2e.pods[0].reason, "Unschedulable");
}

#[tokio::test]
async fn prefix_filters_before_paging() {
    let cluster = FakeClusterAdapter::new();
    for job in ["test-a", "test-b", "test-c", "lint"] {
        submit(&cluster, 5, job).await;
    }
    let query = StatusQuery {
        job_name_prefix: Some("build-5-test".to_string()),
        page: Some(2),
        page_size: Some(2),
    };
    let page = build_status(&cluster, BuildId::new(5), &query)
        .await
        .unwrap();
    assert_eq!(names(&page), vec!["build-5-test-c"]);
    assert_eq!((page.total_items, page.total_pages), (3, 2));
}

#[yare::parameterized(
    zero_page = { Some(0), Some(2), 1, 2 },
    zero_size = { Some(1), Some(0), 1, 20 },
    defaults = { None, None, 1, 20 },
)]
fn page_defaults(
    page: Option<usize>,
    page_size: Option<usize>,
    want_page: usize,
    want_size: usize,
) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let cluster = FakeClusterAdapter::new();
    let query = StatusQuery {
        job_name_prefix: None,
        page,
        page_size,
    };
    let result = rt
        .block_on(build_status(&cluster, BuildId::new(1), &query))
        .unwrap();
    assert_eq!((result.page, result.page_size), (want_page, want_size));
    assert!(result.jobs.is_empty());
    assert_eq!(result.total_pages, 0);
}

#[tokio::test]
async fn page_past_the_end_is_empty() {
    let cluster = FakeClusterAdapter::new();
    submit(&cluster, 2, "only").await;
    let query = StatusQuery {
        page: Some(9),
        ..Default::default()
    };
    let page = build_status(&cluster, BuildId::new(2), &query)
        .await
        .unwrap();
    assert!(page.jobs.is_empty());
    assert_eq!(page.total_items, 1);
}

#[test]
fn condition_serializes_type_field() {
    let info = JobConditionInfo {
        type_: "Failed".to_string(),
        status: "True".to_string(),
        reason: "DeadlineExceeded".to_string(),
        message: String::new(),
    };
    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["type"], "Failed");
}
