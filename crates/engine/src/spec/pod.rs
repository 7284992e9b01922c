// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use k8s_openapi::api::core::v1::{
    Container, EmptyDirVolumeSource, EnvVar, PodSecurityContext, PodSpec, SecurityContext, Volume,
    VolumeMount,
};

pub const RUNNER_CONTAINER: &str = "runner";
pub const WORKSPACE_VOLUME: &str = "workspace";

/// Single `runner` container executing `script` with bash, never restarted.
///
/// The workspace is an emptyDir mounted at `workdir`.
pub fn build_pod_spec(image: &str, script: &str, env: Vec<EnvVar>, workdir: &str) -> PodSpec {
    PodSpec {
        restart_policy: Some("Never".to_string()),
        security_context: Some(PodSecurityContext {
            fs_group: Some(0),
            ..Default::default()
        }),
        volumes: Some(vec![Volume {
            name: WORKSPACE_VOLUME.to_string(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Default::default()
        }]),
        containers: vec![Container {
            name: RUNNER_CONTAINER.to_string(),
            image: Some(image.to_string()),
            security_context: Some(SecurityContext {
                run_as_user: Some(0),
                run_as_group: Some(0),
                ..Default::default()
            }),
            working_dir: Some(workdir.to_string()),
            command: Some(vec!["/bin/bash".to_string(), "-c".to_string()]),
            args: Some(vec![script.to_string()]),
            env: (!env.is_empty()).then_some(env),
            volume_mounts: Some(vec![VolumeMount {
                name: WORKSPACE_VOLUME.to_string(),
                mount_path: workdir.to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }],
        ..Default::default()
    }
}
