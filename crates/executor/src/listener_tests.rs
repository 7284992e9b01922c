// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{pending_build, ONE_JOB};
use tokio::sync::mpsc;
use xci_adapters::FakeClusterAdapter;
use xci_core::test_support::epoch;
use xci_core::{BuildStatus, FakeClock, NewBuildJob, NewBuildStep, NewLogChunk};
use xci_storage::MemoryStore;

struct Harness {
    ctx: ListenerCtx<MemoryStore, FakeClusterAdapter, FakeClock>,
    rx: mpsc::Receiver<BuildId>,
}

impl Harness {
    fn new(depth: usize) -> Self {
        let (queue, rx) = BuildQueue::channel(depth);
        Self {
            ctx: ListenerCtx {
                store: MemoryStore::new(),
                cluster: FakeClusterAdapter::new(),
                clock: FakeClock::at(epoch(300)),
                queue,
                shutdown: Arc::new(Notify::new()),
            },
            rx,
        }
    }

    async fn send(&self, request: Request) -> Response {
        handle_request(request, &self.ctx).await
    }

    fn queued(&mut self) -> Vec<BuildId> {
        let mut ids = Vec::new();
        while let Ok(id) = self.rx.try_recv() {
            ids.push(id);
        }
        ids
    }
}

fn submit(workflow: &str) -> Request {
    Request::Submit {
        pipeline_id: 4,
        name: "ci".to_string(),
        workflow: workflow.to_string(),
        triggered_by: "alice".to_string(),
        commit_sha: "abc123".to_string(),
        branch: "main".to_string(),
        variables: Default::default(),
    }
}

/// A build with one job of two steps and three stored output lines.
async fn build_with_logs(store: &MemoryStore) -> BuildId {
    let build_id = pending_build(store, ONE_JOB).await;
    store
        .create_job(NewBuildJob {
            build_id,
            name: "build".to_string(),
            index: 1,
        })
        .await
        .unwrap();
    let mut steps = Vec::new();
    for (index, name) in ["checkout", "compile"].into_iter().enumerate() {
        let step = store
            .create_step(NewBuildStep {
                build_id,
                job_name: "build".to_string(),
                index: index as u32 + 1,
                name: name.to_string(),
            })
            .await
            .unwrap();
        steps.push(step.id);
    }
    let chunk = |step: BuildStepId, content: &str| NewLogChunk {
        build_step_id: step,
        content: content.to_string(),
        created_at: epoch(1),
    };
    store
        .append_log_chunks(vec![
            chunk(steps[0], "cloned"),
            chunk(steps[1], "cc main.c"),
            chunk(steps[1], "linked"),
        ])
        .await
        .unwrap();
    build_id
}

#[tokio::test]
async fn ping_reports_version() {
    let harness = Harness::new(4);
    assert_eq!(
        harness.send(Request::Ping).await,
        Response::Pong {
            version: PROTOCOL_VERSION.to_string()
        }
    );
}

#[tokio::test]
async fn submit_stores_build_and_snapshot_then_queues_it() {
    let mut harness = Harness::new(4);
    let response = harness.send(submit(ONE_JOB)).await;
    let Response::Submitted { build_id } = response else {
        panic!("unexpected response: {response:?}");
    };
    assert_eq!(harness.queued(), vec![build_id]);

    let store = &harness.ctx.store;
    let build = store.get_build(build_id).await.unwrap().unwrap();
    assert_eq!(build.status, BuildStatus::Pending);
    assert_eq!(build.pipeline_id, 4);
    assert_eq!(build.triggered_by, "alice");
    assert_eq!(build.created_at, epoch(300));

    let snapshot = store.get_snapshot(build_id).await.unwrap().unwrap();
    assert_eq!(snapshot.workflow_yaml, ONE_JOB);
    assert_eq!(snapshot.yaml_hash, yaml_hash(ONE_JOB));
    assert_eq!(snapshot.yaml_hash.len(), 64);
}

#[tokio::test]
async fn submit_rejects_unparseable_workflow_without_storing() {
    let mut harness = Harness::new(4);
    let request = submit("jobs:\n  a:\n    needs: [ghost]\n");
    let response = harness.send(request).await;
    assert!(matches!(
        response,
        Response::Error { message } if message.starts_with("parse workflow")
    ));
    assert!(harness.ctx.store.list_builds().await.unwrap().is_empty());
    assert!(harness.queued().is_empty());
}

#[tokio::test]
async fn submit_with_full_queue_leaves_build_pending() {
    let harness = Harness::new(1);
    harness.ctx.queue.enqueue(BuildId::new(77)).unwrap();

    let response = harness.send(submit(ONE_JOB)).await;
    assert!(matches!(response, Response::Error { message } if message.contains("not queued")));
    let builds = harness.ctx.store.list_builds().await.unwrap();
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0].status, BuildStatus::Pending);
}

#[yare::parameterized(
    malformed = { "nope|main", "malformed build message" },
    unknown = { "41|main", "build 41 not found" },
)]
fn enqueue_rejects(message: &str, expected: &str) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    rt.block_on(async {
        let mut harness = Harness::new(4);
        let response = harness
            .send(Request::Enqueue {
                message: message.to_string(),
            })
            .await;
        assert!(
            matches!(&response, Response::Error { message } if message.contains(expected)),
            "unexpected response: {response:?}"
        );
        assert!(harness.queued().is_empty());
    });
}

#[tokio::test]
async fn enqueue_queues_existing_build() {
    let mut harness = Harness::new(4);
    let build_id = pending_build(&harness.ctx.store, ONE_JOB).await;
    let response = harness
        .send(Request::Enqueue {
            message: format!("{build_id}|main|abc"),
        })
        .await;
    assert_eq!(response, Response::Queued { build_id });
    assert_eq!(harness.queued(), vec![build_id]);
}

#[tokio::test]
async fn get_build_includes_workflow_jobs_and_steps() {
    let harness = Harness::new(4);
    let build_id = build_with_logs(&harness.ctx.store).await;

    let response = harness.send(Request::GetBuild { build_id }).await;
    let Response::Build { detail } = response else {
        panic!("unexpected response: {response:?}");
    };
    assert_eq!(detail.build.id, build_id);
    assert_eq!(detail.workflow.as_deref(), Some(ONE_JOB));
    assert_eq!(detail.jobs.len(), 1);
    let names: Vec<_> = detail.steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["checkout", "compile"]);
}

#[tokio::test]
async fn get_unknown_build_is_an_error() {
    let harness = Harness::new(4);
    let response = harness
        .send(Request::GetBuild {
            build_id: BuildId::new(5),
        })
        .await;
    assert_eq!(response, Response::error("build 5 not found"));
}

#[tokio::test]
async fn list_builds_pages_newest_first_per_pipeline() {
    let harness = Harness::new(8);
    for _ in 0..3 {
        harness.send(submit(ONE_JOB)).await;
    }
    harness
        .ctx
        .store
        .create_build(NewBuild::new(9, "other"), epoch(0))
        .await
        .unwrap();

    let response = harness
        .send(Request::ListBuilds {
            pipeline_id: 4,
            page: Some(1),
            page_size: Some(2),
        })
        .await;
    let Response::Builds { page } = response else {
        panic!("unexpected response: {response:?}");
    };
    let ids: Vec<_> = page.builds.iter().map(|b| b.id.get()).collect();
    assert_eq!(ids, vec![3, 2]);
    assert_eq!(page.total_items, 3);
    assert_eq!(page.total_pages, 2);

    let response = harness
        .send(Request::ListBuilds {
            pipeline_id: 4,
            page: Some(0),
            page_size: None,
        })
        .await;
    let Response::Builds { page } = response else {
        panic!("unexpected response: {response:?}");
    };
    assert_eq!(page.page, 1);
    assert_eq!(page.page_size, DEFAULT_BUILD_PAGE_SIZE);
    assert_eq!(page.builds.len(), 3);
}

#[tokio::test]
async fn logs_page_through_chunks() {
    let harness = Harness::new(4);
    let build_id = build_with_logs(&harness.ctx.store).await;

    let first = harness
        .send(Request::Logs {
            build_id,
            offset: 0,
            limit: 2,
            annotate: false,
        })
        .await;
    assert_eq!(
        first,
        Response::Logs {
            lines: vec!["cloned".to_string(), "cc main.c".to_string()],
            next_offset: 2,
        }
    );

    let rest = harness
        .send(Request::Logs {
            build_id,
            offset: 2,
            limit: 0,
            annotate: false,
        })
        .await;
    assert_eq!(
        rest,
        Response::Logs {
            lines: vec!["linked".to_string()],
            next_offset: 3,
        }
    );
}

#[tokio::test]
async fn annotated_logs_head_each_step() {
    let harness = Harness::new(4);
    let build_id = build_with_logs(&harness.ctx.store).await;

    let response = harness
        .send(Request::Logs {
            build_id,
            offset: 0,
            limit: DEFAULT_LOG_LIMIT,
            annotate: true,
        })
        .await;
    assert_eq!(
        response,
        Response::Logs {
            lines: vec![
                "🔹 Step [checkout] Running".to_string(),
                "cloned".to_string(),
                "🔹 Step [compile] Running".to_string(),
                "cc main.c".to_string(),
                "linked".to_string(),
            ],
            next_offset: 3,
        }
    );
}

#[tokio::test]
async fn cancel_marks_build_cancelled() {
    let harness = Harness::new(4);
    let build_id = pending_build(&harness.ctx.store, ONE_JOB).await;

    let response = harness.send(Request::Cancel { build_id }).await;
    let Response::Cancelled { outcome } = response else {
        panic!("unexpected response: {response:?}");
    };
    assert!(outcome.cancelled);
    assert_eq!(outcome.status, BuildStatus::Cancelled);
    let build = harness
        .ctx
        .store
        .get_build(build_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(build.finished_at, Some(epoch(300)));
}

#[tokio::test]
async fn status_of_build_without_cluster_jobs_is_empty() {
    let harness = Harness::new(4);
    let response = harness
        .send(Request::Status {
            build_id: BuildId::new(1),
            job_name_prefix: None,
            page: None,
            page_size: None,
        })
        .await;
    let Response::Status { status } = response else {
        panic!("unexpected response: {response:?}");
    };
    assert!(status.jobs.is_empty());
    assert_eq!(status.total_items, 0);
}

#[tokio::test]
async fn shutdown_notifies_waiter() {
    let harness = Harness::new(4);
    let shutdown = Arc::clone(&harness.ctx.shutdown);
    let waiter = tokio::spawn(async move { shutdown.notified().await });

    assert_eq!(
        harness.send(Request::Shutdown).await,
        Response::ShuttingDown
    );
    waiter.await.unwrap();
}

#[tokio::test]
async fn serves_requests_over_the_socket() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("executor.sock");
    let socket = UnixListener::bind(&path).unwrap();
    let harness = Harness::new(4);
    let listener = Listener::new(socket, harness.ctx);
    let task = tokio::spawn(listener.run());

    let mut stream = UnixStream::connect(&path).await.unwrap();
    let response = protocol::call(&mut stream, &Request::Ping, DEFAULT_TIMEOUT)
        .await
        .unwrap();
    assert!(matches!(response, Response::Pong { .. }));

    let mut stream = UnixStream::connect(&path).await.unwrap();
    let response = protocol::call(
        &mut stream,
        &Request::GetBuild {
            build_id: BuildId::new(1),
        },
        DEFAULT_TIMEOUT,
    )
    .await
    .unwrap();
    assert_eq!(response, Response::error("build 1 not found"));

    task.abort();
}
