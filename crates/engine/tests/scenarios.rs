// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end engine runs against the fake cluster.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use xci_actions::{ActionRegistry, ActionResolver, FakeTarballSource};
use xci_adapters::{ClusterCall, FakeClusterAdapter, JobPlan, TracedCluster};
use xci_core::test_support::epoch;
use xci_core::{BuildId, BuildStatus, FakeClock, JobStatus, NewBuild, StepStatus};
use xci_engine::{cluster_job_name, init_build_rows, Engine, EngineConfig, EngineDeps};
use xci_script::{STEP_BEGIN, STEP_END, STEP_EXIT};
use xci_storage::{BuildStore, MemoryStore};
use xci_workflow::{parse_workflow, Workflow};

struct Harness {
    store: MemoryStore,
    cluster: FakeClusterAdapter,
    engine: Engine<MemoryStore, TracedCluster<FakeClusterAdapter>, FakeClock>,
    build_id: BuildId,
    workflow: Workflow,
}

impl Harness {
    async fn new(yaml: &str, cluster: FakeClusterAdapter) -> Self {
        let store = MemoryStore::new();
        let build_id = store
            .create_build(NewBuild::new(1, "scenario"), epoch(0))
            .await
            .unwrap()
            .id;
        let workflow = parse_workflow(yaml).unwrap();
        init_build_rows(&store, build_id, &workflow).await.unwrap();
        store.mark_build_started(build_id, epoch(1)).await.unwrap();

        let engine = Engine::new(
            EngineDeps {
                store: store.clone(),
                cluster: TracedCluster::new(cluster.clone()),
                resolver: ActionResolver::new(
                    Arc::new(FakeTarballSource::new()),
                    ActionRegistry::new(),
                ),
            },
            FakeClock::at(epoch(10)),
            EngineConfig::default(),
        );
        Self {
            store,
            cluster,
            engine,
            build_id,
            workflow,
        }
    }

    async fn run(&self) -> BuildStatus {
        self.engine
            .run_workflow(self.build_id, &self.workflow)
            .await
            .unwrap()
    }

    async fn job_status(&self, name: &str) -> JobStatus {
        self.store
            .list_jobs(self.build_id)
            .await
            .unwrap()
            .into_iter()
            .find(|j| j.name == name)
            .map(|j| j.status)
            .unwrap()
    }

    async fn step(&self, job: &str, step: &str) -> (StepStatus, Option<i32>) {
        let row = self
            .store
            .find_step(self.build_id, job, step)
            .await
            .unwrap()
            .unwrap();
        (row.status, row.exit_code)
    }

    fn plan_name(&self, job: &str) -> String {
        cluster_job_name(self.build_id, job)
    }
}

fn ok_step(step: &str, lines: &[&str]) -> Vec<String> {
    let mut out = vec![format!("{STEP_BEGIN} {step}")];
    out.extend(lines.iter().map(|l| l.to_string()));
    out.push(format!("{STEP_EXIT} {step} 0"));
    out.push(format!("{STEP_END} {step}"));
    out
}

const CHAIN: &str = r#"
name: chain
jobs:
  x:
    steps:
      - name: hello
        run: echo hello
  y:
    needs: x
    steps:
      - name: world
        run: echo world
"#;

#[tokio::test(start_paused = true)]
async fn dependent_job_runs_after_its_need_succeeds() {
    let cluster = FakeClusterAdapter::new()
        .with_plan(
            "build-1-x",
            JobPlan::succeeded(ok_step("hello", &["hello"])),
        )
        .with_plan(
            "build-1-y",
            JobPlan::succeeded(ok_step("world", &["world"])),
        );
    let h = Harness::new(CHAIN, cluster).await;

    assert_eq!(h.run().await, BuildStatus::Succeeded);
    assert_eq!(h.job_status("x").await, JobStatus::Succeeded);
    assert_eq!(h.job_status("y").await, JobStatus::Succeeded);
    assert_eq!(h.cluster.submitted(), vec!["build-1-x", "build-1-y"]);
    assert_eq!(h.step("x", "hello").await, (StepStatus::Succeeded, Some(0)));
    assert_eq!(h.step("y", "world").await, (StepStatus::Succeeded, Some(0)));

    let build = h.store.get_build(h.build_id).await.unwrap().unwrap();
    assert_eq!(build.finished_at, Some(epoch(10)));
    let logs: Vec<_> = h
        .store
        .list_log_chunks(h.build_id, 0, 10)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.content)
        .collect();
    assert_eq!(logs, vec!["hello", "world"]);
}

#[tokio::test(start_paused = true)]
async fn dependent_of_failed_job_stays_pending() {
    let mut logs = vec![format!("{STEP_BEGIN} hello"), "boom".to_string()];
    logs.push(format!("{STEP_EXIT} hello 1"));
    let cluster = FakeClusterAdapter::new().with_plan("build-1-x", JobPlan::failed(logs));
    let h = Harness::new(CHAIN, cluster).await;

    assert_eq!(h.run().await, BuildStatus::Failed);
    assert_eq!(h.job_status("x").await, JobStatus::Failed);
    assert_eq!(h.job_status("y").await, JobStatus::Pending);
    assert_eq!(h.cluster.submitted(), vec!["build-1-x"]);
    assert_eq!(h.step("x", "hello").await, (StepStatus::Failed, Some(1)));
    assert_eq!(h.step("y", "world").await, (StepStatus::Pending, None));

    let build = h.store.get_build(h.build_id).await.unwrap().unwrap();
    assert_eq!(build.status, BuildStatus::Failed);
    assert!(build.finished_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn continue_on_error_step_records_code_and_job_succeeds() {
    let yaml = r#"
jobs:
  x:
    steps:
      - name: flaky
        run: exit 7
        continue-on-error: true
      - name: after
        run: echo still here
"#;
    let mut logs = vec![
        format!("{STEP_BEGIN} flaky"),
        format!("{STEP_EXIT} flaky 7"),
        format!("{STEP_END} flaky"),
    ];
    logs.extend(ok_step("after", &["still here"]));
    let cluster = FakeClusterAdapter::new().with_plan("build-1-x", JobPlan::succeeded(logs));
    let h = Harness::new(yaml, cluster).await;

    assert_eq!(h.run().await, BuildStatus::Succeeded);
    assert_eq!(h.job_status("x").await, JobStatus::Succeeded);
    assert_eq!(h.step("x", "flaky").await, (StepStatus::Succeeded, Some(7)));
    assert_eq!(h.step("x", "after").await, (StepStatus::Succeeded, Some(0)));

    // The flaky step's code is reported but does not abort the script.
    let job = h.cluster.job(&h.plan_name("x")).unwrap();
    let script = job.spec.unwrap().template.spec.unwrap().containers[0]
        .args
        .clone()
        .unwrap()
        .remove(0);
    let flaky = script
        .split(STEP_END)
        .next()
        .unwrap();
    assert!(flaky.contains("exit 7"));
    assert!(!flaky.contains("exit $code"));
}

#[tokio::test(start_paused = true)]
async fn unschedulable_pod_fails_job_without_status_polling() {
    let yaml = r#"
jobs:
  gpu:
    env:
      XC_RESOURCE_CPU_REQUEST: "64"
    steps:
      - name: train
        run: python train.py
      - name: upload
        run: ./upload.sh
"#;
    let cluster = FakeClusterAdapter::new().with_plan(
        "build-1-gpu",
        JobPlan::unschedulable("0/2 nodes are available: 2 Insufficient cpu."),
    );
    let h = Harness::new(yaml, cluster).await;

    let started = tokio::time::Instant::now();
    assert_eq!(h.run().await, BuildStatus::Failed);
    assert_eq!(h.job_status("gpu").await, JobStatus::Failed);
    assert_eq!(h.step("gpu", "train").await.0, StepStatus::Skipped);
    assert_eq!(h.step("gpu", "upload").await.0, StepStatus::Skipped);

    // Only the readiness window elapsed: no log stream, no counter polling.
    assert!(started.elapsed() <= std::time::Duration::from_secs(16));
    let calls = h.cluster.calls();
    assert!(!calls
        .iter()
        .any(|c| matches!(c, ClusterCall::StreamLogs { .. } | ClusterCall::GetJob { .. })));
}
