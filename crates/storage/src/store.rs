// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The row-store interface used by the engine and the executor.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use xci_core::{
    Build, BuildId, BuildJob, BuildJobEdge, BuildSnapshot, BuildStatus, BuildStep, BuildStepId,
    BuildStepLogChunk, JobUpdate, NewBuild, NewBuildJob, NewBuildStep, NewLogChunk, StepStatus,
    StepUpdate,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("build {0} not found")]
    BuildNotFound(BuildId),
    #[error("job {job} not found in build {build_id}")]
    JobNotFound { build_id: BuildId, job: String },
    #[error("step {0} not found")]
    StepNotFound(BuildStepId),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Keyed CRUD access to build, job, step and log rows.
///
/// Status-changing writes on a build return `false` instead of an error when
/// the build is already terminal.
#[async_trait]
pub trait BuildStore: Clone + Send + Sync + 'static {
    async fn create_build(
        &self,
        new: NewBuild,
        created_at: DateTime<Utc>,
    ) -> Result<Build, StoreError>;

    async fn get_build(&self, id: BuildId) -> Result<Option<Build>, StoreError>;

    /// RUNNING + `started_at`.
    async fn mark_build_started(&self, id: BuildId, at: DateTime<Utc>)
        -> Result<bool, StoreError>;

    /// Move a build to `status`, recording `finished_at` when given.
    async fn set_build_status(
        &self,
        id: BuildId,
        status: BuildStatus,
        finished_at: Option<DateTime<Utc>>,
    ) -> Result<bool, StoreError>;

    async fn save_snapshot(&self, snapshot: BuildSnapshot) -> Result<(), StoreError>;

    async fn get_snapshot(&self, id: BuildId) -> Result<Option<BuildSnapshot>, StoreError>;

    async fn count_jobs(&self, build_id: BuildId) -> Result<usize, StoreError>;

    async fn create_job(&self, new: NewBuildJob) -> Result<BuildJob, StoreError>;

    async fn create_edge(&self, edge: BuildJobEdge) -> Result<(), StoreError>;

    async fn create_step(&self, new: NewBuildStep) -> Result<BuildStep, StoreError>;

    async fn update_job(
        &self,
        build_id: BuildId,
        name: &str,
        update: JobUpdate,
    ) -> Result<(), StoreError>;

    async fn find_step(
        &self,
        build_id: BuildId,
        job_name: &str,
        step_name: &str,
    ) -> Result<Option<BuildStep>, StoreError>;

    async fn update_step(&self, id: BuildStepId, update: StepUpdate) -> Result<(), StoreError>;

    /// Move every step of `job_name` in status `from` to `to`, stamping
    /// `finished_at`. Returns how many rows changed.
    async fn transition_steps(
        &self,
        build_id: BuildId,
        job_name: &str,
        from: StepStatus,
        to: StepStatus,
        at: DateTime<Utc>,
    ) -> Result<usize, StoreError>;

    async fn append_log_chunks(&self, chunks: Vec<NewLogChunk>) -> Result<(), StoreError>;

    async fn list_builds(&self) -> Result<Vec<Build>, StoreError>;

    /// Jobs of a build in declaration order.
    async fn list_jobs(&self, build_id: BuildId) -> Result<Vec<BuildJob>, StoreError>;

    async fn list_edges(&self, build_id: BuildId) -> Result<Vec<BuildJobEdge>, StoreError>;

    /// Steps of a build ordered by job index then step index.
    async fn list_steps(&self, build_id: BuildId) -> Result<Vec<BuildStep>, StoreError>;

    /// Log chunks of every step of a build, in insertion order.
    async fn list_log_chunks(
        &self,
        build_id: BuildId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<BuildStepLogChunk>, StoreError>;
}
