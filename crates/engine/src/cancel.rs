// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build cancellation.

use crate::error::EngineError;
use crate::naming::build_selector;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use xci_adapters::ClusterAdapter;
use xci_core::{BuildId, BuildStatus, Clock};
use xci_storage::BuildStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOutcome {
    /// False when the build had already finished.
    pub cancelled: bool,
    /// Cluster jobs deleted.
    pub deleted: Vec<String>,
    pub status: BuildStatus,
}

/// Delete every cluster job of `build_id` and mark the build cancelled.
///
/// Finished builds are left untouched. Deletion is best effort: a job
/// that cannot be listed or deleted is logged and skipped. Jobs still running in
/// this process may write their own outcome afterwards; the build row
/// stays cancelled.
pub async fn cancel_build<S, C, K>(
    store: &S,
    cluster: &C,
    clock: &K,
    build_id: BuildId,
) -> Result<CancelOutcome, EngineError>
where
    S: BuildStore,
    C: ClusterAdapter,
    K: Clock,
{
    let build = store
        .get_build(build_id)
        .await?
        .ok_or(EngineError::BuildNotFound(build_id))?;
    if build.status.is_terminal() {
        info!(
            build_id = %build_id,
            status = %build.status,
            "cancel ignored; build already finished"
        );
        return Ok(CancelOutcome {
            cancelled: false,
            deleted: Vec::new(),
            status: build.status,
        });
    }

    let jobs = match cluster.list_jobs(&build_selector(build_id)).await {
        Ok(jobs) => jobs,
        Err(e) => {
            warn!(build_id = %build_id, error = %e, "could not list jobs to delete");
            Vec::new()
        }
    };
    let mut deleted = Vec::new();
    for job in jobs {
        let Some(name) = job.metadata.name else {
            continue;
        };
        match cluster.delete_job(&name).await {
            Ok(()) => deleted.push(name),
            Err(e) => warn!(build_id = %build_id, job = %name, error = %e, "could not delete job"),
        }
    }

    let cancelled = store
        .set_build_status(build_id, BuildStatus::Cancelled, Some(clock.now()))
        .await?;
    let status = if cancelled {
        BuildStatus::Cancelled
    } else {
        store
            .get_build(build_id)
            .await?
            .map_or(BuildStatus::Cancelled, |b| b.status)
    };
    info!(build_id = %build_id, deleted = deleted.len(), cancelled, "cancel processed");
    Ok(CancelOutcome {
        cancelled,
        deleted,
        status,
    })
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;
