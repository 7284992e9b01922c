// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process `BuildStore` backed by keyed tables.

use crate::store::{BuildStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use xci_core::{
    Build, BuildId, BuildJob, BuildJobEdge, BuildJobId, BuildSnapshot, BuildStatus, BuildStep,
    BuildStepId, BuildStepLogChunk, JobStatus, JobUpdate, NewBuild, NewBuildJob, NewBuildStep,
    NewLogChunk, StepStatus, StepUpdate,
};

/// Every row the store holds. Serialized whole into checkpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default)]
    pub builds: BTreeMap<BuildId, Build>,
    #[serde(default)]
    pub snapshots: BTreeMap<BuildId, BuildSnapshot>,
    #[serde(default)]
    pub jobs: BTreeMap<BuildJobId, BuildJob>,
    #[serde(default)]
    pub edges: Vec<BuildJobEdge>,
    #[serde(default)]
    pub steps: BTreeMap<BuildStepId, BuildStep>,
    #[serde(default)]
    pub log_chunks: Vec<BuildStepLogChunk>,
    #[serde(default)]
    pub next_ids: NextIds,
}

/// Last id handed out per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextIds {
    pub build: u64,
    pub job: u64,
    pub step: u64,
    pub chunk: u64,
}

impl Tables {
    fn job_mut(&mut self, build_id: BuildId, name: &str) -> Option<&mut BuildJob> {
        self.jobs
            .values_mut()
            .find(|j| j.build_id == build_id && j.name == name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from previously checkpointed tables.
    pub fn from_tables(tables: Tables) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tables)),
        }
    }

    /// Copy of the current tables for checkpointing.
    pub fn tables(&self) -> Tables {
        self.inner.lock().clone()
    }
}

#[async_trait]
impl BuildStore for MemoryStore {
    async fn create_build(
        &self,
        new: NewBuild,
        created_at: DateTime<Utc>,
    ) -> Result<Build, StoreError> {
        let mut t = self.inner.lock();
        t.next_ids.build += 1;
        let build = new.into_build(BuildId::new(t.next_ids.build), created_at);
        t.builds.insert(build.id, build.clone());
        Ok(build)
    }

    async fn get_build(&self, id: BuildId) -> Result<Option<Build>, StoreError> {
        Ok(self.inner.lock().builds.get(&id).cloned())
    }

    async fn mark_build_started(
        &self,
        id: BuildId,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut t = self.inner.lock();
        let build = t.builds.get_mut(&id).ok_or(StoreError::BuildNotFound(id))?;
        if build.status.is_terminal() {
            return Ok(false);
        }
        build.status = BuildStatus::Running;
        build.started_at = Some(at);
        Ok(true)
    }

    async fn set_build_status(
        &self,
        id: BuildId,
        status: BuildStatus,
        finished_at: Option<DateTime<Utc>>,
    ) -> Result<bool, StoreError> {
        let mut t = self.inner.lock();
        let build = t.builds.get_mut(&id).ok_or(StoreError::BuildNotFound(id))?;
        if build.status.is_terminal() {
            return Ok(false);
        }
        build.status = status;
        if finished_at.is_some() {
            build.finished_at = finished_at;
        }
        Ok(true)
    }

    async fn save_snapshot(&self, snapshot: BuildSnapshot) -> Result<(), StoreError> {
        self.inner
            .lock()
            .snapshots
            .insert(snapshot.build_id, snapshot);
        Ok(())
    }

    async fn get_snapshot(&self, id: BuildId) -> Result<Option<BuildSnapshot>, StoreError> {
        Ok(self.inner.lock().snapshots.get(&id).cloned())
    }

    async fn count_jobs(&self, build_id: BuildId) -> Result<usize, StoreError> {
        Ok(self
            .inner
            .lock()
            .jobs
            .values()
            .filter(|j| j.build_id == build_id)
            .count())
    }

    async fn create_job(&self, new: NewBuildJob) -> Result<BuildJob, StoreError> {
        let mut t = self.inner.lock();
        t.next_ids.job += 1;
        let job = BuildJob {
            id: BuildJobId::new(t.next_ids.job),
            build_id: new.build_id,
            name: new.name,
            status: JobStatus::Pending,
            index: new.index,
            started_at: None,
            finished_at: None,
        };
        t.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn create_edge(&self, edge: BuildJobEdge) -> Result<(), StoreError> {
        self.inner.lock().edges.push(edge);
        Ok(())
    }

    async fn create_step(&self, new: NewBuildStep) -> Result<BuildStep, StoreError> {
        let mut t = self.inner.lock();
        t.next_ids.step += 1;
        let step = BuildStep {
            id: BuildStepId::new(t.next_ids.step),
            build_id: new.build_id,
            job_name: new.job_name,
            index: new.index,
            name: new.name,
            status: StepStatus::Pending,
            started_at: None,
            finished_at: None,
            exit_code: None,
        };
        t.steps.insert(step.id, step.clone());
        Ok(step)
    }

    async fn update_job(
        &self,
        build_id: BuildId,
        name: &str,
        update: JobUpdate,
    ) -> Result<(), StoreError> {
        let mut t = self.inner.lock();
        let job = t
            .job_mut(build_id, name)
            .ok_or_else(|| StoreError::JobNotFound {
                build_id,
                job: name.to_string(),
            })?;
        update.apply(job);
        Ok(())
    }

    async fn find_step(
        &self,
        build_id: BuildId,
        job_name: &str,
        step_name: &str,
    ) -> Result<Option<BuildStep>, StoreError> {
        Ok(self
            .inner
            .lock()
            .steps
            .values()
            .find(|s| s.build_id == build_id && s.job_name == job_name && s.name == step_name)
            .cloned())
    }

    async fn update_step(&self, id: BuildStepId, update: StepUpdate) -> Result<(), StoreError> {
        let mut t = self.inner.lock();
        let step = t.steps.get_mut(&id).ok_or(StoreError::StepNotFound(id))?;
        update.apply(step);
        Ok(())
    }

    async fn transition_steps(
        &self,
        build_id: BuildId,
        job_name: &str,
        from: StepStatus,
        to: StepStatus,
        at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let mut t = self.inner.lock();
        let mut changed = 0;
        for step in t.steps.values_mut() {
            if step.build_id == build_id && step.job_name == job_name && step.status == from {
                step.status = to;
                step.finished_at = Some(at);
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn append_log_chunks(&self, chunks: Vec<NewLogChunk>) -> Result<(), StoreError> {
        let mut t = self.inner.lock();
        if let Some(missing) = chunks
            .iter()
            .map(|c| c.build_step_id)
            .find(|id| !t.steps.contains_key(id))
        {
            return Err(StoreError::StepNotFound(missing));
        }
        for chunk in chunks {
            t.next_ids.chunk += 1;
            let id = t.next_ids.chunk;
            t.log_chunks.push(BuildStepLogChunk {
                id,
                build_step_id: chunk.build_step_id,
                content: chunk.content,
                created_at: chunk.created_at,
            });
        }
        Ok(())
    }

    async fn list_builds(&self) -> Result<Vec<Build>, StoreError> {
        Ok(self.inner.lock().builds.values().cloned().collect())
    }

    async fn list_jobs(&self, build_id: BuildId) -> Result<Vec<BuildJob>, StoreError> {
        let t = self.inner.lock();
        let mut jobs: Vec<BuildJob> = t
            .jobs
            .values()
            .filter(|j| j.build_id == build_id)
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.index);
        Ok(jobs)
    }

    async fn list_edges(&self, build_id: BuildId) -> Result<Vec<BuildJobEdge>, StoreError> {
        Ok(self
            .inner
            .lock()
            .edges
            .iter()
            .filter(|e| e.build_id == build_id)
            .cloned()
            .collect())
    }

    async fn list_steps(&self, build_id: BuildId) -> Result<Vec<BuildStep>, StoreError> {
        let t = self.inner.lock();
        let job_index = |name: &str| {
            t.jobs
                .values()
                .find(|j| j.build_id == build_id && j.name == name)
                .map(|j| j.index)
                .unwrap_or(u32::MAX)
        };
        let mut steps: Vec<BuildStep> = t
            .steps
            .values()
            .filter(|s| s.build_id == build_id)
            .cloned()
            .collect();
        steps.sort_by_key(|s| (job_index(&s.job_name), s.index));
        Ok(steps)
    }

    async fn list_log_chunks(
        &self,
        build_id: BuildId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<BuildStepLogChunk>, StoreError> {
        let t = self.inner.lock();
        Ok(t.log_chunks
            .iter()
            .filter(|c| {
                t.steps
                    .get(&c.build_step_id)
                    .is_some_and(|s| s.build_id == build_id)
            })
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
