// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-build job rows and dependency edges.

use crate::{BuildId, BuildJobId, JobStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One workflow job inside one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildJob {
    pub id: BuildJobId,
    pub build_id: BuildId,
    pub name: String,
    pub status: JobStatus,
    /// Declaration order within the workflow, starting at 1.
    pub index: u32,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBuildJob {
    pub build_id: BuildId,
    pub name: String,
    pub index: u32,
}

/// A `needs` relation: `to_job` waits for `from_job`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildJobEdge {
    pub build_id: BuildId,
    pub from_job: String,
    pub to_job: String,
}

/// Partial update applied to a job row. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobUpdate {
    pub fn running(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(JobStatus::Running),
            started_at: Some(at),
            finished_at: None,
        }
    }

    pub fn finished(status: JobStatus, at: DateTime<Utc>) -> Self {
        Self {
            status: Some(status),
            started_at: None,
            finished_at: Some(at),
        }
    }

    pub fn apply(&self, job: &mut BuildJob) {
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(at) = self.started_at {
            job.started_at = Some(at);
        }
        if let Some(at) = self.finished_at {
            job.finished_at = Some(at);
        }
    }
}
