// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs one workflow job as a cluster batch job.
//!
//! A job moves pending → running → succeeded | failed. Whatever the
//! outcome, the job row is closed and its steps are finalized so no step
//! is left running or pending.

use crate::config::EngineConfig;
use crate::error::JobError;
use crate::log_processor::LogProcessor;
use crate::naming::cluster_job_name;
use crate::pods::{first_pod_name, unschedulable_reason, wait_for_container};
use crate::spec::{build_job_spec, SpecContext, RUNNER_CONTAINER};
use futures::StreamExt;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use xci_actions::ActionResolver;
use xci_adapters::ClusterAdapter;
use xci_core::{BuildId, Clock, JobStatus, JobUpdate, StepStatus};
use xci_script::{build_script, ActionFragment, Fragments};
use xci_storage::BuildStore;
use xci_workflow::Job;

pub struct JobScheduler<S, C, K> {
    store: S,
    cluster: C,
    clock: K,
    resolver: ActionResolver,
    config: Arc<EngineConfig>,
}

impl<S: Clone, C: Clone, K: Clone> Clone for JobScheduler<S, C, K> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cluster: self.cluster.clone(),
            clock: self.clock.clone(),
            resolver: self.resolver.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, C, K> JobScheduler<S, C, K>
where
    S: BuildStore,
    C: ClusterAdapter,
    K: Clock,
{
    pub fn new(
        store: S,
        cluster: C,
        clock: K,
        resolver: ActionResolver,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            store,
            cluster,
            clock,
            resolver,
            config,
        }
    }

    /// Run `job` to completion. `Ok` means the job succeeded.
    pub async fn run_job(&self, build_id: BuildId, name: &str, job: &Job) -> Result<(), JobError> {
        let span = info_span!("job", build_id = %build_id, job = name);
        async {
            self.update_job(build_id, name, JobUpdate::running(self.clock.now()))
                .await;

            let result = self.execute(build_id, name, job).await;
            match &result {
                Ok(()) => info!("job succeeded"),
                Err(e) => warn!(error = %e, "job failed"),
            }
            self.close(build_id, name, result.is_ok()).await;
            result
        }
        .instrument(span)
        .await
    }

    /// Write the job's terminal status and finalize its steps.
    pub(crate) async fn close(&self, build_id: BuildId, name: &str, succeeded: bool) {
        let status = if succeeded {
            JobStatus::Succeeded
        } else {
            JobStatus::Failed
        };
        let now = self.clock.now();
        self.update_job(build_id, name, JobUpdate::finished(status, now))
            .await;
        self.finalize_steps(build_id, name, succeeded).await;
    }

    async fn execute(&self, build_id: BuildId, name: &str, job: &Job) -> Result<(), JobError> {
        let fragments = self.resolve_actions(job).await;
        let script = build_script(job, &fragments);

        let cluster_name = cluster_job_name(build_id, name);
        let spec = build_job_spec(
            SpecContext {
                namespace: self.cluster.namespace(),
                build_id,
                name: &cluster_name,
                default_image: &self.config.default_image,
                workdir: &self.config.workdir,
            },
            job,
            &script,
        );
        self.cluster
            .submit_job(&spec)
            .await
            .map_err(|source| JobError::Submit {
                job: cluster_name.clone(),
                source,
            })?;

        let pod = first_pod_name(
            &self.cluster,
            &cluster_name,
            self.config.pod_poll_attempts,
            self.config.pod_poll_interval,
        )
        .await
        .ok_or_else(|| JobError::PodNotFound(cluster_name.clone()))?;

        let (observed, ready) = wait_for_container(
            &self.cluster,
            &pod,
            RUNNER_CONTAINER,
            self.config.ready_timeout,
            self.config.ready_poll_interval,
        )
        .await;
        if !ready {
            if let Some(reason) = observed.as_ref().and_then(unschedulable_reason) {
                return Err(JobError::Unschedulable {
                    job: name.to_string(),
                    reason,
                });
            }
            return Err(JobError::NotReady(format!("pod={pod} container={RUNNER_CONTAINER}")));
        }

        self.stream_logs(build_id, name, &pod).await?;
        self.wait_for_completion(&cluster_name).await
    }

    /// Shell fragments for every `uses:` step. Failures become error
    /// fragments that fail the step at run time.
    async fn resolve_actions(&self, job: &Job) -> Fragments {
        let mut fragments = Fragments::new();
        for step in job.steps.iter().filter(|s| s.has_uses()) {
            let fragment = match self.resolver.resolve(step, job).await {
                Ok(script) => ActionFragment::Script(script),
                Err(e) => {
                    warn!(
                        step = %step.name,
                        uses = %step.uses,
                        error = %e,
                        "action resolution failed"
                    );
                    ActionFragment::Error(e.to_string())
                }
            };
            fragments.insert(step.name.clone(), fragment);
        }
        fragments
    }

    async fn stream_logs(&self, build_id: BuildId, name: &str, pod: &str) -> Result<(), JobError> {
        let mut lines = self
            .cluster
            .stream_logs(pod, RUNNER_CONTAINER)
            .await
            .map_err(JobError::Stream)?;
        let mut processor = LogProcessor::new(
            self.store.clone(),
            self.clock.clone(),
            build_id,
            name,
            self.config.log_batch,
        );
        while let Some(line) = lines.next().await {
            match line {
                Ok(line) => processor.on_line(&line).await,
                Err(e) => {
                    processor.finish().await;
                    return Err(JobError::Stream(e));
                }
            }
        }
        processor.finish().await;
        Ok(())
    }

    /// Poll the cluster job's counters until one of them is set.
    async fn wait_for_completion(&self, cluster_name: &str) -> Result<(), JobError> {
        let attempts = self.config.status_poll_attempts;
        for attempt in 1..=attempts {
            match self.cluster.get_job(cluster_name).await {
                Ok(Some(job)) => {
                    let status = job.status.unwrap_or_default();
                    if status.succeeded.unwrap_or(0) > 0 {
                        return Ok(());
                    }
                    if status.failed.unwrap_or(0) > 0 {
                        return Err(JobError::Failed(cluster_name.to_string()));
                    }
                }
                Ok(None) => warn!(job = cluster_name, "cluster job disappeared"),
                Err(e) => {
                    warn!(job = cluster_name, attempt, error = %e, "job status lookup failed")
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.config.status_poll_interval).await;
            }
        }
        Err(JobError::StatusUnknown(cluster_name.to_string()))
    }

    async fn finalize_steps(&self, build_id: BuildId, name: &str, succeeded: bool) {
        let running_to = if succeeded {
            StepStatus::Succeeded
        } else {
            StepStatus::Failed
        };
        let now = self.clock.now();
        for (from, to) in [
            (StepStatus::Running, running_to),
            (StepStatus::Pending, StepStatus::Skipped),
        ] {
            if let Err(e) = self
                .store
                .transition_steps(build_id, name, from, to, now)
                .await
            {
                warn!(job = name, from = %from, to = %to, error = %e, "step finalize failed");
            }
        }
    }

    async fn update_job(&self, build_id: BuildId, name: &str, update: JobUpdate) {
        if let Err(e) = self.store.update_job(build_id, name, update).await {
            warn!(job = name, error = %e, "job update failed");
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
