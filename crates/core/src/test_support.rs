// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{
    Build, BuildId, BuildJob, BuildJobId, BuildStatus, BuildStep, BuildStepId, JobStatus,
    StepStatus,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Timestamp `secs` seconds after the Unix epoch.
pub fn epoch(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

pub fn build_row(id: u64, status: BuildStatus) -> Build {
    Build {
        id: BuildId::new(id),
        pipeline_id: 1,
        name: format!("build-{}", id),
        status,
        triggered_by: "test".to_string(),
        commit_sha: String::new(),
        branch: "main".to_string(),
        variables: BTreeMap::new(),
        created_at: epoch(0),
        started_at: None,
        finished_at: None,
    }
}

pub fn job_row(build_id: u64, name: &str, index: u32) -> BuildJob {
    BuildJob {
        id: BuildJobId::new(u64::from(index)),
        build_id: BuildId::new(build_id),
        name: name.to_string(),
        status: JobStatus::Pending,
        index,
        started_at: None,
        finished_at: None,
    }
}

pub fn step_row(build_id: u64, job: &str, index: u32, name: &str) -> BuildStep {
    BuildStep {
        id: BuildStepId::new(u64::from(index)),
        build_id: BuildId::new(build_id),
        job_name: job.to_string(),
        index,
        name: name.to_string(),
        status: StepStatus::Pending,
        started_at: None,
        finished_at: None,
        exit_code: None,
    }
}
