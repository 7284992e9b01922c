// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step rows and their log chunks.

use crate::{BuildId, BuildStepId, StepStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStep {
    pub id: BuildStepId,
    pub build_id: BuildId,
    pub job_name: String,
    /// Position within the job, starting at 1.
    pub index: u32,
    pub name: String,
    pub status: StepStatus,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exit_code: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBuildStep {
    pub build_id: BuildId,
    pub job_name: String,
    pub index: u32,
    pub name: String,
}

/// Partial update applied to a step row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepUpdate {
    pub status: Option<StepStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub exit_code: Option<i32>,
}

impl StepUpdate {
    pub fn started(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(StepStatus::Running),
            started_at: Some(at),
            ..Default::default()
        }
    }

    pub fn finished(status: StepStatus, at: DateTime<Utc>) -> Self {
        Self {
            status: Some(status),
            finished_at: Some(at),
            ..Default::default()
        }
    }

    pub fn exit_code(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Default::default()
        }
    }

    pub fn apply(&self, step: &mut BuildStep) {
        if let Some(status) = self.status {
            step.status = status;
        }
        if let Some(at) = self.started_at {
            step.started_at = Some(at);
        }
        if let Some(at) = self.finished_at {
            step.finished_at = Some(at);
        }
        if let Some(code) = self.exit_code {
            step.exit_code = Some(code);
        }
    }
}

/// One persisted output line of a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStepLogChunk {
    pub id: u64,
    pub build_step_id: BuildStepId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogChunk {
    pub build_step_id: BuildStepId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
