// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Names and label selectors for cluster objects.

use xci_adapters::label_selector;
use xci_core::BuildId;

pub const APP_LABEL: &str = "app";
pub const APP_LABEL_VALUE: &str = "ci-executor-build";
pub const BUILD_ID_LABEL: &str = "xcoding.io/build-id";
/// Set by the cluster on every pod a job creates.
pub const JOB_NAME_LABEL: &str = "job-name";

const MAX_NAME_LEN: usize = 63;

/// Cluster job name for workflow job `job` of `build_id`.
///
/// `build-<id>-<job>` as a DNS-1123 label: lowercase, anything outside
/// `[a-z0-9-]` becomes `-`, at most 63 characters, alphanumeric at both
/// ends.
pub fn cluster_job_name(build_id: BuildId, job: &str) -> String {
    let raw = format!("build-{}-{}", build_id, job);
    let mut name: String = raw
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '-'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();
    while name.ends_with('-') {
        name.pop();
    }
    name
}

/// Selects every cluster job of a build.
pub fn build_selector(build_id: BuildId) -> String {
    label_selector([(BUILD_ID_LABEL, build_id.to_string().as_str())])
}

/// Selects the pods of one cluster job.
pub fn pod_selector(cluster_job: &str) -> String {
    label_selector([(JOB_NAME_LABEL, cluster_job)])
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod tests;
