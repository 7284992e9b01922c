// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use thiserror::Error;
use xci_adapters::ClusterError;
use xci_core::BuildId;
use xci_storage::StoreError;
use xci_workflow::ParseError;

/// Why one job ended in "failed".
#[derive(Debug, Error)]
pub enum JobError {
    #[error("create job {job}: {source}")]
    Submit {
        job: String,
        #[source]
        source: ClusterError,
    },
    #[error("pod not found for job {0}")]
    PodNotFound(String),
    #[error("job unschedulable: {job}: {reason}")]
    Unschedulable { job: String, reason: String },
    #[error("container not ready: {0}")]
    NotReady(String),
    #[error("logs stream: {0}")]
    Stream(#[source] ClusterError),
    #[error("job failed: {0}")]
    Failed(String),
    #[error("job status unknown after logs: {0}")]
    StatusUnknown(String),
    #[error("job task for {0} did not complete")]
    Aborted(String),
}

/// Errors that stop a build before or outside scheduling
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("cluster error: {0}")]
    Cluster(#[from] ClusterError),
    #[error("parse workflow: {0}")]
    Parse(#[from] ParseError),
    #[error("build not found: {0}")]
    BuildNotFound(BuildId),
    #[error("no workflow snapshot for build {0}")]
    SnapshotNotFound(BuildId),
}
