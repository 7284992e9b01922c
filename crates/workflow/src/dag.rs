// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job dependency graph.
//!
//! Cycles are not detected: jobs on a cycle never become ready and the
//! build is left running.

use crate::{Job, Workflow};
use indexmap::IndexMap;

#[derive(Debug, Clone, Default)]
pub struct Dag {
    /// Jobs in declaration order, with workflow env merged in.
    pub jobs: IndexMap<String, Job>,
    /// For each job, the jobs that list it in `needs`.
    pub dependents: IndexMap<String, Vec<String>>,
}

impl Dag {
    pub fn build(workflow: &Workflow) -> Self {
        let jobs = workflow.merged_jobs();
        let mut dependents: IndexMap<String, Vec<String>> = IndexMap::new();
        for (name, job) in &jobs {
            for need in job.needs.iter() {
                dependents
                .entry(need.clone())
                .or_default()
                .push(name.clone());
            }
        }
        Self { jobs, dependents }
    }

    /// Jobs with no `needs`, in declaration order.
    pub fn roots(&self) -> Vec<String> {
        self.jobs
            .iter()
            .filter(|(_, job)| job.needs.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn needs(&self, job: &str) -> &[String] {
        self.jobs
            .get(job)
            .map(|j| j.needs.as_slice())
            .unwrap_or_default()
    }

    pub fn dependents(&self, job: &str) -> &[String] {
        self.dependents
            .get(job)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "dag_tests.rs"]
mod tests;
