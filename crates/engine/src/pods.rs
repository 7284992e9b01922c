// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pod discovery and readiness polling.

use crate::naming::pod_selector;
use k8s_openapi::api::core::v1::Pod;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};
use xci_adapters::ClusterAdapter;

/// Name of the first pod created for `cluster_job`.
///
/// Looks up to `attempts` times, sleeping `interval` between lookups.
pub async fn first_pod_name<C: ClusterAdapter>(
    cluster: &C,
    cluster_job: &str,
    attempts: u32,
    interval: Duration,
) -> Option<String> {
    let selector = pod_selector(cluster_job);
    for attempt in 1..=attempts {
        match cluster.list_pods(&selector).await {
            Ok(pods) => {
                if let Some(name) = pods.into_iter().find_map(|p| p.metadata.name) {
                    return Some(name);
                }
            }
            Err(e) => warn!(job = cluster_job, attempt, error = %e, "pod lookup failed"),
        }
        if attempt < attempts {
            tokio::time::sleep(interval).await;
        }
    }
    None
}

/// Wait until `container` of `pod` is ready, running or terminated.
///
/// Returns the last pod observed, and whether the container started
/// before `timeout`.
pub async fn wait_for_container<C: ClusterAdapter>(
    cluster: &C,
    pod: &str,
    container: &str,
    timeout: Duration,
    interval: Duration,
) -> (Option<Pod>, bool) {
    let deadline = Instant::now() + timeout;
    let mut last = None;
    loop {
        match cluster.get_pod(pod).await {
            Ok(Some(observed)) => {
                if container_started(&observed, container) {
                    return (Some(observed), true);
                }
                last = Some(observed);
            }
            Ok(None) => debug!(pod, "pod not visible yet"),
            Err(e) => warn!(pod, error = %e, "pod fetch failed"),
        }
        if Instant::now() + interval > deadline {
            return (last, false);
        }
        tokio::time::sleep(interval).await;
    }
}

/// Whether the named container is ready, running or has already exited.
pub fn container_started(pod: &Pod, container: &str) -> bool {
    pod.status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
        .into_iter()
        .flatten()
        .filter(|cs| cs.name == container)
        .any(|cs| {
            let state = cs.state.as_ref();
            cs.ready
                || state.is_some_and(|s| s.running.is_some() || s.terminated.is_some())
        })
}

/// The scheduler's message when the pod's `PodScheduled` condition is
/// `False` with reason `Unschedulable`.
pub fn unschedulable_reason(pod: &Pod) -> Option<String> {
    pod.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .into_iter()
        .flatten()
        .find(|c| {
            c.type_ == "PodScheduled"
                && c.status == "False"
                && c.reason.as_deref() == Some("Unschedulable")
        })
        .map(|c| {
            c.message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Unschedulable".to_string())
        })
}

#[cfg(test)]
#[path = "pods_tests.rs"]
mod tests;
