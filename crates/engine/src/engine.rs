// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DAG engine: runs a workflow's jobs in waves.
//!
//! Jobs without needs form the first wave. Every job of a wave runs as
//! its own task; once the whole wave has finished, each dependent whose
//! needs have all succeeded joins the next wave. A job with a failed
//! need is never started and stays pending.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::rows::init_build_rows;
use crate::scheduler::JobScheduler;
use indexmap::IndexMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, info_span, warn, Instrument};
use xci_actions::ActionResolver;
use xci_adapters::ClusterAdapter;
use xci_core::{BuildId, BuildStatus, Clock, JobStatus};
use xci_storage::{BuildStore, StoreError};
use xci_workflow::{parse_workflow, Dag, Workflow};

/// Collaborators the engine drives.
pub struct EngineDeps<S, C> {
    pub store: S,
    pub cluster: C,
    pub resolver: ActionResolver,
}

pub struct Engine<S, C, K> {
    store: S,
    clock: K,
    scheduler: JobScheduler<S, C, K>,
}

impl<S, C, K> Engine<S, C, K>
where
    S: BuildStore,
    C: ClusterAdapter,
    K: Clock,
{
    pub fn new(deps: EngineDeps<S, C>, clock: K, config: EngineConfig) -> Self {
        let scheduler = JobScheduler::new(
            deps.store.clone(),
            deps.cluster,
            clock.clone(),
            deps.resolver,
            Arc::new(config),
        );
        Self {
            store: deps.store,
            clock,
            scheduler,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Execute a queued build from its stored workflow snapshot.
    ///
    /// Marks the build running, parses the snapshot, creates job and step
    /// rows if none exist yet, then runs the workflow. A snapshot that
    /// fails to parse fails the build. A build that is already terminal,
    /// for example cancelled while queued, is not run.
    pub async fn run_build(&self, build_id: BuildId) -> Result<BuildStatus, EngineError> {
        let span = info_span!("build", build_id = %build_id);
        async {
            let now = self.clock.now();
            let started = match self.store.mark_build_started(build_id, now).await {
                Ok(started) => started,
                Err(StoreError::BuildNotFound(id)) => return Err(EngineError::BuildNotFound(id)),
                Err(e) => return Err(e.into()),
            };
            if !started {
                let status = self
                    .store
                    .get_build(build_id)
                    .await?
                    .map(|b| b.status)
                    .ok_or(EngineError::BuildNotFound(build_id))?;
                info!(status = %status, "build already finished; not running it");
                return Ok(status);
            }

            let snapshot = self
                .store
                .get_snapshot(build_id)
                .await?
                .ok_or(EngineError::SnapshotNotFound(build_id))?;

            let workflow = match parse_workflow(&snapshot.workflow_yaml) {
                Ok(workflow) => workflow,
                Err(e) => {
                    error!(error = %e, "workflow snapshot does not parse");
                    self.store
                        .set_build_status(build_id, BuildStatus::Failed, Some(self.clock.now()))
                        .await?;
                    return Err(e.into());
                }
            };

            if init_build_rows(&self.store, build_id, &workflow).await? {
                info!(jobs = workflow.jobs.len(), "build rows created");
            }
            self.run_workflow(build_id, &workflow).await
        }
        .instrument(span)
        .await
    }

    /// Run every reachable job of `workflow` and record the build outcome.
    pub async fn run_workflow(
        &self,
        build_id: BuildId,
        workflow: &Workflow,
    ) -> Result<BuildStatus, EngineError> {
        let dag = Dag::build(workflow);
        let mut states: IndexMap<String, JobStatus> = dag
            .jobs
            .keys()
            .map(|name| (name.clone(), JobStatus::Pending))
            .collect();

        let mut wave = dag.roots();
        let mut wave_number = 0u32;
        while !wave.is_empty() {
            wave_number += 1;
            info!(build_id = %build_id, wave = wave_number, jobs = ?wave, "starting wave");

            let mut tasks = JoinSet::new();
            for name in &wave {
                let Some(job) = dag.jobs.get(name).cloned() else {
                    continue;
                };
                states.insert(name.clone(), JobStatus::Running);
                let scheduler = self.scheduler.clone();
                let name = name.clone();
                tasks.spawn(async move {
                    let result = scheduler.run_job(build_id, &name, &job).await;
                    (name, result)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((name, result)) => {
                        let status = if result.is_ok() {
                            JobStatus::Succeeded
                        } else {
                            JobStatus::Failed
                        };
                        states.insert(name, status);
                    }
                    Err(e) => error!(build_id = %build_id, error = %e, "job task did not complete"),
                }
            }

            // A task that panicked never reported; its job counts as failed.
            for name in &wave {
                if states.get(name) == Some(&JobStatus::Running) {
                    warn!(build_id = %build_id, job = %name, "job task aborted");
                    states.insert(name.clone(), JobStatus::Failed);
                    self.scheduler.close(build_id, name, false).await;
                }
            }

            wave = next_wave(&dag, &wave, &states);
        }

        let status = compute_build_status(states.values().copied());
        let finished_at = matches!(status, BuildStatus::Succeeded | BuildStatus::Failed)
            .then(|| self.clock.now());
        if self
            .store
            .set_build_status(build_id, status, finished_at)
            .await?
        {
            info!(build_id = %build_id, status = %status, "build finished");
        } else {
            info!(
                build_id = %build_id,
                status = %status,
                "build already terminal; status left unchanged"
            );
        }
        Ok(status)
    }
}

/// Dependents of `finished` whose needs have all succeeded, in the order
/// they are first reached.
fn next_wave(dag: &Dag, finished: &[String], states: &IndexMap<String, JobStatus>) -> Vec<String> {
    let mut next: Vec<String> = Vec::new();
    for name in finished {
        if states.get(name) != Some(&JobStatus::Succeeded) {
            continue;
        }
        for dependent in dag.dependents(name) {
            if states.get(dependent) != Some(&JobStatus::Pending) || next.contains(dependent) {
                continue;
            }
            let ready = dag
                .needs(dependent)
                .iter()
                .all(|need| states.get(need) == Some(&JobStatus::Succeeded));
            if ready {
                next.push(dependent.clone());
            }
        }
    }
    next
}

/// Build outcome from its job outcomes.
///
/// Any failure fails the build; all successes (or no jobs) succeed it;
/// otherwise work is still outstanding and the build stays running.
pub fn compute_build_status(jobs: impl IntoIterator<Item = JobStatus>) -> BuildStatus {
    let mut all_succeeded = true;
    for status in jobs {
        match status {
            JobStatus::Failed => return BuildStatus::Failed,
            JobStatus::Succeeded => {}
            JobStatus::Pending | JobStatus::Running => all_succeeded = false,
        }
    }
    if all_succeeded {
        BuildStatus::Succeeded
    } else {
        BuildStatus::Running
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
