// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job, edge and step rows for a new build.

use xci_core::{BuildId, BuildJobEdge, NewBuildJob, NewBuildStep};
use xci_storage::{BuildStore, StoreError};
use xci_workflow::Workflow;

/// Create the pending rows of `workflow` unless the build already has jobs.
///
/// Jobs and steps are indexed from 1 in declaration order; one edge is
/// written per `needs` entry. Returns whether rows were created.
pub async fn init_build_rows<S: BuildStore>(
    store: &S,
    build_id: BuildId,
    workflow: &Workflow,
) -> Result<bool, StoreError> {
    if store.count_jobs(build_id).await? > 0 {
        return Ok(false);
    }
    for (job_index, (name, job)) in workflow.jobs.iter().enumerate() {
        store
            .create_job(NewBuildJob {
                build_id,
                name: name.clone(),
                index: index(job_index),
            })
            .await?;
        for need in job.needs.iter() {
            store
                .create_edge(BuildJobEdge {
                    build_id,
                    from_job: need.clone(),
                    to_job: name.clone(),
                })
                .await?;
        }
        for (step_index, step) in job.steps.iter().enumerate() {
            store
                .create_step(NewBuildStep {
                    build_id,
                    job_name: name.clone(),
                    index: index(step_index),
                    name: step.name.clone(),
                })
                .await?;
        }
    }
    Ok(true)
}

fn index(position: usize) -> u32 {
    u32::try_from(position + 1).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[path = "rows_tests.rs"]
mod tests;
