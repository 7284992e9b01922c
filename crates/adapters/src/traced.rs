// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::cluster::{ClusterAdapter, ClusterError, LogLines};
use async_trait::async_trait;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Pod;
use std::time::Instant;
use tracing::Instrument;

/// Wrapper that adds tracing to any ClusterAdapter
#[derive(Clone)]
pub struct TracedCluster<C> {
    inner: C,
}

impl<C> TracedCluster<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[async_trait]
impl<C: ClusterAdapter> ClusterAdapter for TracedCluster<C> {
    fn namespace(&self) -> &str {
        self.inner.namespace()
    }

    async fn submit_job(&self, job: &Job) -> Result<Job, ClusterError> {
        let name = job.metadata.name.as_deref().unwrap_or_default();
        async {
            let start = Instant::now();
            let result = self.inner.submit_job(job).await;
            let elapsed_ms = elapsed_ms(start);
            match &result {
                Ok(_) => tracing::info!(elapsed_ms, "job submitted"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "submit failed"),
            }
            result
        }
        .instrument(tracing::info_span!("cluster.submit", name, namespace = self.namespace()))
        .await
    }

    async fn get_job(&self, name: &str) -> Result<Option<Job>, ClusterError> {
        let result = self.inner.get_job(name).await;
        match &result {
            Ok(job) => tracing::trace!(name, found = job.is_some(), "job fetched"),
            Err(e) => tracing::warn!(name, error = %e, "get_job failed"),
        }
        result
    }

    async fn list_jobs(&self, selector: &str) -> Result<Vec<Job>, ClusterError> {
        let start = Instant::now();
        let result = self.inner.list_jobs(selector).await;
        tracing::info_span!("cluster.list_jobs", selector).in_scope(|| match &result {
            Ok(jobs) => {
                tracing::debug!(count = jobs.len(), elapsed_ms = elapsed_ms(start), "listed")
            }
            Err(e) => tracing::warn!(error = %e, "list failed"),
        });
        result
    }

    async fn delete_job(&self, name: &str) -> Result<(), ClusterError> {
        let result = self.inner.delete_job(name).await;
        tracing::info_span!("cluster.delete", name).in_scope(|| match &result {
            Ok(()) => tracing::info!("deleted"),
            Err(e) => tracing::warn!(error = %e, "delete failed (may be expected)"),
        });
        result
    }

    async fn list_pods(&self, selector: &str) -> Result<Vec<Pod>, ClusterError> {
        let result = self.inner.list_pods(selector).await;
        match &result {
            Ok(pods) => tracing::trace!(selector, count = pods.len(), "pods listed"),
            Err(e) => tracing::warn!(selector, error = %e, "list_pods failed"),
        }
        result
    }

    async fn get_pod(&self, name: &str) -> Result<Option<Pod>, ClusterError> {
        let result = self.inner.get_pod(name).await;
        tracing::trace!(name, found = ?result.as_ref().ok().map(Option::is_some), "pod fetched");
        result
    }

    async fn stream_logs(&self, pod: &str, container: &str) -> Result<LogLines, ClusterError> {
        let start = Instant::now();
        let result = self.inner.stream_logs(pod, container).await;
        let elapsed_ms = elapsed_ms(start);
        tracing::info_span!("cluster.logs", pod, container).in_scope(|| match &result {
            Ok(_) => tracing::info!(elapsed_ms, "log stream opened"),
            Err(e) => tracing::error!(elapsed_ms, error = %e, "log stream failed"),
        });
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
