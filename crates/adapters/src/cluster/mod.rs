// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster workload adapters

mod k8s;
mod selector;

pub use k8s::KubeClusterAdapter;
pub use selector::{label_selector, matches_selector};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ClusterCall, FakeClusterAdapter, JobOutcome, JobPlan};

use async_trait::async_trait;
use futures::stream::BoxStream;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Pod;
use thiserror::Error;

/// Errors from cluster operations
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("cluster API error: {0}")]
    Api(String),
    #[error("log stream error: {0}")]
    Stream(String),
}

/// Container output, one line per item, ending when the container exits.
pub type LogLines = BoxStream<'static, Result<String, ClusterError>>;

/// Batch jobs and pods in one namespace.
#[async_trait]
pub trait ClusterAdapter: Clone + Send + Sync + 'static {
    /// Namespace every call operates in
    fn namespace(&self) -> &str;

    /// Create a job; returns the object as stored by the cluster
    async fn submit_job(&self, job: &Job) -> Result<Job, ClusterError>;

    async fn get_job(&self, name: &str) -> Result<Option<Job>, ClusterError>;

    /// Jobs matching a `k=v,k2=v2` label selector
    async fn list_jobs(&self, selector: &str) -> Result<Vec<Job>, ClusterError>;

    /// Delete a job and, in the background, its pods
    async fn delete_job(&self, name: &str) -> Result<(), ClusterError>;

    async fn list_pods(&self, selector: &str) -> Result<Vec<Pod>, ClusterError>;

    async fn get_pod(&self, name: &str) -> Result<Option<Pod>, ClusterError>;

    /// Follow a container's output
    async fn stream_logs(&self, pod: &str, container: &str) -> Result<LogLines, ClusterError>;
}
