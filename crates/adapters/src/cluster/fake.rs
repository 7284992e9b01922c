// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake cluster adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{matches_selector, ClusterAdapter, ClusterError, LogLines};
use async_trait::async_trait;
use futures::StreamExt;
use k8s_openapi::api::batch::v1::{Job, JobStatus};
use k8s_openapi::api::core::v1::{
    ContainerState, ContainerStateRunning, ContainerStatus, Pod, PodCondition, PodSpec, PodStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

const NAMESPACE: &str = "test";

/// Recorded cluster call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterCall {
    SubmitJob { name: String },
    GetJob { name: String },
    ListJobs { selector: String },
    DeleteJob { name: String },
    ListPods { selector: String },
    GetPod { name: String },
    StreamLogs { pod: String, container: String },
}

/// Terminal counter the fake reports once a job is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    Failed,
}

/// Scripted behavior for one cluster job, keyed by job name.
#[derive(Debug, Clone)]
pub struct JobPlan {
    /// Lines the `runner` container prints.
    pub logs: Vec<String>,
    /// `None` leaves both counters unset forever.
    pub outcome: Option<JobOutcome>,
    /// Leave the pod unscheduled with this reason.
    pub unschedulable: Option<String>,
    /// Never create a pod for the job.
    pub no_pod: bool,
    pub submit_error: Option<String>,
    /// Fail the log stream after the scripted lines.
    pub stream_error: Option<String>,
}

impl Default for JobPlan {
    fn default() -> Self {
        Self::succeeded(Vec::<String>::new())
    }
}

impl JobPlan {
    pub fn succeeded<S: Into<String>>(logs: impl IntoIterator<Item = S>) -> Self {
        Self::with_outcome(logs, Some(JobOutcome::Succeeded))
    }

    pub fn failed<S: Into<String>>(logs: impl IntoIterator<Item = S>) -> Self {
        Self::with_outcome(logs, Some(JobOutcome::Failed))
    }

    fn with_outcome<S: Into<String>>(
        logs: impl IntoIterator<Item = S>,
        outcome: Option<JobOutcome>,
    ) -> Self {
        Self {
            logs: logs.into_iter().map(Into::into).collect(),
            outcome,
            unschedulable: None,
            no_pod: false,
            submit_error: None,
            stream_error: None,
        }
    }

    pub fn unschedulable(reason: impl Into<String>) -> Self {
        Self {
            unschedulable: Some(reason.into()),
            outcome: None,
            ..Self::default()
        }
    }

    pub fn no_pod() -> Self {
        Self {
            no_pod: true,
            outcome: None,
            ..Self::default()
        }
    }

    pub fn submit_error(message: impl Into<String>) -> Self {
        Self {
            submit_error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn never_finishes<S: Into<String>>(logs: impl IntoIterator<Item = S>) -> Self {
        Self::with_outcome(logs, None)
    }

    pub fn stream_error(mut self, message: impl Into<String>) -> Self {
        self.stream_error = Some(message.into());
        self
    }
}

#[derive(Default)]
struct FakeClusterState {
    plans: HashMap<String, JobPlan>,
    default_plan: JobPlan,
    jobs: BTreeMap<String, Job>,
    pods: BTreeMap<String, Pod>,
    calls: Vec<ClusterCall>,
    list_jobs_error: Option<String>,
}

/// In-memory cluster that runs jobs according to [`JobPlan`]s.
#[derive(Clone)]
pub struct FakeClusterAdapter {
    inner: Arc<Mutex<FakeClusterState>>,
}

impl Default for FakeClusterAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeClusterAdapter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeClusterState::default())),
        }
    }

    /// Script the job with this cluster name.
    pub fn with_plan(self, job_name: impl Into<String>, plan: JobPlan) -> Self {
        self.set_plan(job_name, plan);
        self
    }

    pub fn set_plan(&self, job_name: impl Into<String>, plan: JobPlan) {
        self.inner.lock().plans.insert(job_name.into(), plan);
    }

    /// Plan used for jobs without one of their own.
    pub fn with_default_plan(self, plan: JobPlan) -> Self {
        self.inner.lock().default_plan = plan;
        self
    }

    /// Fail every `list_jobs` call with this message.
    pub fn fail_list_jobs(&self, message: impl Into<String>) {
        self.inner.lock().list_jobs_error = Some(message.into());
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ClusterCall> {
        self.inner.lock().calls.clone()
    }

    /// Jobs currently stored, by name
    pub fn job(&self, name: &str) -> Option<Job> {
        self.inner.lock().jobs.get(name).cloned()
    }

    pub fn job_names(&self) -> Vec<String> {
        self.inner.lock().jobs.keys().cloned().collect()
    }

    /// Names passed to `submit_job`, in order
    pub fn submitted(&self) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                ClusterCall::SubmitJob { name } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Store a job directly, bypassing plans.
    pub fn insert_job(&self, job: Job) {
        let name = job.metadata.name.clone().unwrap_or_default();
        self.inner.lock().jobs.insert(name, job);
    }

    fn record(&self, call: ClusterCall) {
        self.inner.lock().calls.push(call);
    }
}

fn job_status(outcome: Option<JobOutcome>) -> JobStatus {
    match outcome {
        Some(JobOutcome::Succeeded) => JobStatus {
            succeeded: Some(1),
            ..Default::default()
        },
        Some(JobOutcome::Failed) => JobStatus {
            failed: Some(1),
            ..Default::default()
        },
        None => JobStatus {
            active: Some(1),
            ..Default::default()
        },
    }
}

fn pod_for(job_name: &str, plan: &JobPlan) -> Pod {
    let labels = BTreeMap::from([("job-name".to_string(), job_name.to_string())]);
    let status = match &plan.unschedulable {
        Some(reason) => PodStatus {
            phase: Some("Pending".to_string()),
            conditions: Some(vec![PodCondition {
                type_: "PodScheduled".to_string(),
                status: "False".to_string(),
                reason: Some("Unschedulable".to_string()),
                message: Some(reason.clone()),
                ..Default::default()
            }]),
            ..Default::default()
        },
        None => PodStatus {
            phase: Some("Running".to_string()),
            conditions: Some(vec![PodCondition {
                type_: "Ready".to_string(),
                status: "True".to_string(),
                ..Default::default()
            }]),
            container_statuses: Some(vec![ContainerStatus {
                name: "runner".to_string(),
                ready: true,
                state: Some(ContainerState {
                    running: Some(ContainerStateRunning::default()),
                    ..Default::default()
                }),
                ..Default::default()
            }]),
            ..Default::default()
        },
    };
    Pod {
        metadata: ObjectMeta {
            name: Some(format!("{job_name}-pod")),
            labels: Some(labels),
            ..Default::default()
        },
        spec: Some(PodSpec {
            node_name: plan
                .unschedulable
                .is_none()
                .then(|| "fake-node".to_string()),
            ..Default::default()
        }),
        status: Some(status),
    }
}

#[async_trait]
impl ClusterAdapter for FakeClusterAdapter {
    fn namespace(&self) -> &str {
        NAMESPACE
    }

    async fn submit_job(&self, job: &Job) -> Result<Job, ClusterError> {
        let name = job.metadata.name.clone().unwrap_or_default();
        self.record(ClusterCall::SubmitJob { name: name.clone() });

        let mut state = self.inner.lock();
        let plan = state
            .plans
            .get(&name)
            .cloned()
            .unwrap_or_else(|| state.default_plan.clone());
        if let Some(message) = plan.submit_error {
            return Err(ClusterError::Api(message));
        }
        if state.jobs.contains_key(&name) {
            return Err(ClusterError::Api(format!("jobs \"{name}\" already exists")));
        }

        let mut stored = job.clone();
        stored.metadata.namespace = Some(NAMESPACE.to_string());
        stored.status = Some(job_status(plan.outcome));
        if !plan.no_pod {
            let pod = pod_for(&name, &plan);
            let pod_name = pod.metadata.name.clone().unwrap_or_default();
            state.pods.insert(pod_name, pod);
        }
        state.jobs.insert(name, stored.clone());
        Ok(stored)
    }

    async fn get_job(&self, name: &str) -> Result<Option<Job>, ClusterError> {
        self.record(ClusterCall::GetJob {
            name: name.to_string(),
        });
        Ok(self.inner.lock().jobs.get(name).cloned())
    }

    async fn list_jobs(&self, selector: &str) -> Result<Vec<Job>, ClusterError> {
        self.record(ClusterCall::ListJobs {
            selector: selector.to_string(),
        });
        let state = self.inner.lock();
        if let Some(message) = &state.list_jobs_error {
            return Err(ClusterError::Api(message.clone()));
        }
        Ok(state
            .jobs
            .values()
            .filter(|j| matches_selector(selector, j.metadata.labels.as_ref()))
            .cloned()
            .collect())
    }

    async fn delete_job(&self, name: &str) -> Result<(), ClusterError> {
        self.record(ClusterCall::DeleteJob {
            name: name.to_string(),
        });
        let mut state = self.inner.lock();
        if state.jobs.remove(name).is_none() {
            return Err(ClusterError::NotFound(name.to_string()));
        }
        state.pods.retain(|_, pod| {
            !matches_selector(&format!("job-name={name}"), pod.metadata.labels.as_ref())
        });
        Ok(())
    }

    async fn list_pods(&self, selector: &str) -> Result<Vec<Pod>, ClusterError> {
        self.record(ClusterCall::ListPods {
            selector: selector.to_string(),
        });
        Ok(self
            .inner
            .lock()
            .pods
            .values()
            .filter(|p| matches_selector(selector, p.metadata.labels.as_ref()))
            .cloned()
            .collect())
    }

    async fn get_pod(&self, name: &str) -> Result<Option<Pod>, ClusterError> {
        self.record(ClusterCall::GetPod {
            name: name.to_string(),
        });
        Ok(self.inner.lock().pods.get(name).cloned())
    }

    async fn stream_logs(&self, pod: &str, container: &str) -> Result<LogLines, ClusterError> {
        self.record(ClusterCall::StreamLogs {
            pod: pod.to_string(),
            container: container.to_string(),
        });
        let state = self.inner.lock();
        let job_name = state
            .pods
            .get(pod)
            .and_then(|p| p.metadata.labels.as_ref())
            .and_then(|l| l.get("job-name"))
            .cloned()
            .ok_or_else(|| ClusterError::NotFound(pod.to_string()))?;
        let plan = state
            .plans
            .get(&job_name)
            .cloned()
            .unwrap_or_else(|| state.default_plan.clone());

        let mut items: Vec<Result<String, ClusterError>> = plan.logs.into_iter().map(Ok).collect();
        if let Some(message) = plan.stream_error {
            items.push(Err(ClusterError::Stream(message)));
        }
        Ok(futures::stream::iter(items).boxed())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
