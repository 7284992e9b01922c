// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live cluster view of a build's jobs and pods.

use crate::naming::{build_selector, pod_selector};
use k8s_openapi::api::batch::v1::Job as ClusterJob;
use k8s_openapi::api::core::v1::Pod;
use serde::{Deserialize, Serialize};
use xci_adapters::{ClusterAdapter, ClusterError};
use xci_core::BuildId;

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Filter and page selection for [`build_status`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusQuery {
    /// Keep only cluster jobs whose name starts with this.
    #[serde(default)]
    pub job_name_prefix: Option<String>,
    /// 1-based; 0 or absent means the first page.
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConditionInfo {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    pub reason: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodInfo {
    pub name: String,
    pub phase: String,
    pub node: String,
    /// Reason of the pod's last condition.
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPodStatus {
    pub job_name: String,
    pub succeeded: i32,
    pub failed: i32,
    pub conditions: Vec<JobConditionInfo>,
    pub pods: Vec<PodInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPage {
    pub jobs: Vec<JobPodStatus>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Cluster jobs labeled with `build_id`, sorted by name, filtered and
/// paged per `query`. Pods are only fetched for jobs on the page.
pub async fn build_status<C: ClusterAdapter>(
    cluster: &C,
    build_id: BuildId,
    query: &StatusQuery,
) -> Result<StatusPage, ClusterError> {
    let prefix = query.job_name_prefix.as_deref().unwrap_or_default();
    let mut jobs: Vec<ClusterJob> = cluster
        .list_jobs(&build_selector(build_id))
        .await?
        .into_iter()
        .filter(|job| job_name(job).starts_with(prefix))
        .collect();
    jobs.sort_by(|a, b| job_name(a).cmp(job_name(b)));

    let page = query.page.filter(|p| *p > 0).unwrap_or(1);
    let page_size = query
        .page_size
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE);
    let total_items = jobs.len();
    let total_pages = total_items.div_ceil(page_size);

    let mut out = Vec::new();
    for job in jobs
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
    {
        let pods = cluster.list_pods(&pod_selector(job_name(&job))).await?;
        out.push(job_pod_status(&job, &pods));
    }

    Ok(StatusPage {
        jobs: out,
        page,
        page_size,
        total_items,
        total_pages,
    })
}

fn job_name(job: &ClusterJob) -> &str {
    job.metadata.name.as_deref().unwrap_or_default()
}

fn job_pod_status(job: &ClusterJob, pods: &[Pod]) -> JobPodStatus {
    let status = job.status.clone().unwrap_or_default();
    JobPodStatus {
        job_name: job_name(job).to_string(),
        succeeded: status.succeeded.unwrap_or(0),
        failed: status.failed.unwrap_or(0),
        conditions: status
            .conditions
            .unwrap_or_default()
            .into_iter()
            .map(|c| JobConditionInfo {
                type_: c.type_,
                status: c.status,
                reason: c.reason.unwrap_or_default(),
                message: c.message.unwrap_or_default(),
            })
            .collect(),
        pods: pods.iter().map(pod_info).collect(),
    }
}

fn pod_info(pod: &Pod) -> PodInfo {
    let status = pod.status.as_ref();
    PodInfo {
        name: pod.metadata.name.clone().unwrap_or_default(),
        phase: status.and_then(|s| s.phase.clone()).unwrap_or_default(),
        node: pod
            .spec
            .as_ref()
            .and_then(|s| s.node_name.clone())
            .unwrap_or_default(),
        reason: status
            .and_then(|s| s.conditions.as_ref())
            .and_then(|c| c.last())
            .and_then(|c| c.reason.clone())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
