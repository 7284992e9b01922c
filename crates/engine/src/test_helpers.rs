// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the engine crate.

use crate::config::EngineConfig;
use crate::scheduler::JobScheduler;
use std::sync::Arc;
use xci_actions::{ActionRegistry, ActionResolver, FakeTarballSource};
use xci_adapters::FakeClusterAdapter;
use xci_core::test_support::epoch;
use xci_core::{BuildId, BuildStep, BuildStepId, FakeClock, NewBuild, NewBuildJob, NewBuildStep};
use xci_script::{STEP_BEGIN, STEP_END, STEP_EXIT};
use xci_storage::{BuildStore, MemoryStore};
use xci_workflow::{Job, Step};

/// A store holding one build with the given jobs and steps, in order.
///
/// Returns the store, the build id and every step id.
pub(crate) async fn seeded_store(
    jobs: &[(&str, &[&str])],
) -> (MemoryStore, BuildId, Vec<BuildStepId>) {
    let store = MemoryStore::new();
    let build = store
        .create_build(NewBuild::new(1, "test"), epoch(0))
        .await
        .unwrap();
    let mut step_ids = Vec::new();
    for (job_index, (job, steps)) in jobs.iter().enumerate() {
        store
            .create_job(NewBuildJob {
                build_id: build.id,
                name: job.to_string(),
                index: job_index as u32 + 1,
            })
            .await
            .unwrap();
        for (step_index, step) in steps.iter().enumerate() {
            let row = store
                .create_step(NewBuildStep {
                    build_id: build.id,
                    job_name: job.to_string(),
                    index: step_index as u32 + 1,
                    name: step.to_string(),
                })
                .await
                .unwrap();
            step_ids.push(row.id);
        }
    }
    (store, build.id, step_ids)
}

pub(crate) async fn step_named(
    store: &MemoryStore,
    build_id: BuildId,
    job: &str,
    step: &str,
) -> BuildStep {
    store.find_step(build_id, job, step).await.unwrap().unwrap()
}

/// Resolver with no remote tarballs; every remote `uses:` answers 404.
pub(crate) fn resolver(registry: ActionRegistry) -> ActionResolver {
    ActionResolver::new(Arc::new(FakeTarballSource::new()), registry)
}

pub(crate) type TestScheduler = JobScheduler<MemoryStore, FakeClusterAdapter, FakeClock>;

/// Scheduler over a seeded store, with default tunables.
pub(crate) async fn scheduler_fixture(
    jobs: &[(&str, &[&str])],
    cluster: FakeClusterAdapter,
    registry: ActionRegistry,
) -> (TestScheduler, MemoryStore, BuildId) {
    let (store, build_id, _) = seeded_store(jobs).await;
    let scheduler = JobScheduler::new(
        store.clone(),
        cluster,
        FakeClock::at(epoch(1_000)),
        resolver(registry),
        Arc::new(EngineConfig::default()),
    );
    (scheduler, store, build_id)
}

/// Job with one `run:` step per name.
pub(crate) fn job_with_steps(steps: &[&str]) -> Job {
    Job {
        steps: steps
            .iter()
            .map(|name| Step {
                name: name.to_string(),
                run: format!("echo {}", name),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

/// Output of a step that exits with `code`.
pub(crate) fn step_output(step: &str, lines: &[&str], code: i32) -> Vec<String> {
    let mut out = vec![format!("{} {}", STEP_BEGIN, step)];
    out.extend(lines.iter().map(|l| l.to_string()));
    out.push(format!("{} {} {}", STEP_EXIT, step, code));
    if code == 0 {
        out.push(format!("{} {}", STEP_END, step));
    }
    out
}
