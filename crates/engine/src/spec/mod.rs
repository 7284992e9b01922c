// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workload specs: one batch job per workflow job.
//!
//! Job-env conventions select resources, wall-clock limit and cleanup TTL;
//! secret references become secret-backed env vars.

mod pod;
mod resources;
mod secrets;
mod ttl;

pub use pod::{build_pod_spec, RUNNER_CONTAINER, WORKSPACE_VOLUME};
pub use resources::{build_resources, is_quantity};
pub use secrets::build_env_vars;
pub use ttl::{active_deadline_seconds, ttl_seconds, DEFAULT_TTL_SECONDS};

use crate::naming::{APP_LABEL, APP_LABEL_VALUE, BUILD_ID_LABEL};
use k8s_openapi::api::batch::v1::{Job as ClusterJob, JobSpec};
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use xci_core::BuildId;
use xci_workflow::Job;

/// Inputs that are not part of the workflow job itself.
#[derive(Debug, Clone, Copy)]
pub struct SpecContext<'a> {
    pub namespace: &'a str,
    pub build_id: BuildId,
    /// Cluster job name, see [`crate::cluster_job_name`].
    pub name: &'a str,
    pub default_image: &'a str,
    pub workdir: &'a str,
}

pub fn build_labels(build_id: BuildId) -> BTreeMap<String, String> {
    BTreeMap::from([
        (APP_LABEL.to_string(), APP_LABEL_VALUE.to_string()),
        (BUILD_ID_LABEL.to_string(), build_id.to_string()),
    ])
}

/// Assemble the batch job that runs `script` for `job`.
pub fn build_job_spec(ctx: SpecContext<'_>, job: &Job, script: &str) -> ClusterJob {
    let image = job
        .container
        .as_deref()
        .map(str::trim)
        .filter(|image| !image.is_empty())
        .unwrap_or(ctx.default_image);

    let mut pod = build_pod_spec(image, script, build_env_vars(job), ctx.workdir);
    if let Some(runner) = pod.containers.first_mut() {
        runner.resources = build_resources(&job.env);
    }

    let labels = build_labels(ctx.build_id);
    ClusterJob {
        metadata: ObjectMeta {
            name: Some(ctx.name.to_string()),
            namespace: Some(ctx.namespace.to_string()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(JobSpec {
            backoff_limit: Some(0),
            ttl_seconds_after_finished: ttl_seconds(&job.env),
            active_deadline_seconds: active_deadline_seconds(&job.env),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(pod),
            },
            ..Default::default()
        }),
        status: None,
    }
}

#[cfg(test)]
#[path = "../spec_tests.rs"]
mod tests;
