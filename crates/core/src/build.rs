// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build rows and the workflow snapshot captured at trigger time.

use crate::{BuildId, BuildStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One triggered run of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub id: BuildId,
    pub pipeline_id: u64,
    pub name: String,
    pub status: BuildStatus,
    #[serde(default)]
    pub triggered_by: String,
    #[serde(default)]
    pub commit_sha: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Fields supplied when a build is triggered. The store assigns the id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBuild {
    pub pipeline_id: u64,
    pub name: String,
    #[serde(default)]
    pub triggered_by: String,
    #[serde(default)]
    pub commit_sha: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl NewBuild {
    pub fn new(pipeline_id: u64, name: impl Into<String>) -> Self {
        Self {
            pipeline_id,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Materialize the row in PENDING state.
    pub fn into_build(self, id: BuildId, created_at: DateTime<Utc>) -> Build {
        Build {
            id,
            pipeline_id: self.pipeline_id,
            name: self.name,
            status: BuildStatus::Pending,
            triggered_by: self.triggered_by,
            commit_sha: self.commit_sha,
            branch: self.branch,
            variables: self.variables,
            created_at,
            started_at: None,
            finished_at: None,
        }
    }
}

/// Workflow text captured when the build was triggered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSnapshot {
    pub build_id: BuildId,
    pub pipeline_id: u64,
    pub name: String,
    pub workflow_yaml: String,
    /// Hex SHA-256 of `workflow_yaml`.
    pub yaml_hash: String,
    pub created_at: DateTime<Utc>,
}
