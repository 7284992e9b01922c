// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! Each connection carries one request. Builds are handed to the consumer
//! through the [`BuildQueue`]; everything else is answered from the store
//! or the cluster directly.

use std::collections::HashMap;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::io::BufReader;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};
use xci_adapters::ClusterAdapter;
use xci_core::{BuildId, BuildSnapshot, BuildStepId, Clock, NewBuild};
use xci_engine::{build_status, cancel_build, StatusQuery};
use xci_script::{format_step_log, STEP_BEGIN};
use xci_storage::BuildStore;
use xci_workflow::parse_workflow;

use crate::consumer::{parse_build_message, BuildQueue};
use crate::protocol::{
    self, BuildDetail, BuildPage, Request, Response, DEFAULT_BUILD_PAGE_SIZE, DEFAULT_LOG_LIMIT,
    DEFAULT_TIMEOUT, PROTOCOL_VERSION,
};

/// Everything a request handler may touch.
pub struct ListenerCtx<S, C, K> {
    pub store: S,
    pub cluster: C,
    pub clock: K,
    pub queue: BuildQueue,
    pub shutdown: Arc<Notify>,
}

/// Listener task for accepting socket connections.
pub struct Listener<S, C, K> {
    socket: UnixListener,
    ctx: Arc<ListenerCtx<S, C, K>>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}

impl<S, C, K> Listener<S, C, K>
where
    S: BuildStore,
    C: ClusterAdapter,
    K: Clock,
{
    pub fn new(socket: UnixListener, ctx: ListenerCtx<S, C, K>) -> Self {
        Self {
            socket,
            ctx: Arc::new(ctx),
        }
    }

    /// Run the listener loop, spawning a task for each connection.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            match e {
                                ConnectionError::Protocol(
                                    protocol::ProtocolError::ConnectionClosed,
                                ) => debug!("Client disconnected"),
                                ConnectionError::Protocol(protocol::ProtocolError::Timeout) => {
                                    warn!("Connection timeout")
                                }
                                _ => error!("Connection error: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection<S, C, K>(
    stream: UnixStream,
    ctx: &ListenerCtx<S, C, K>,
) -> Result<(), ConnectionError>
where
    S: BuildStore,
    C: ClusterAdapter,
    K: Clock,
{
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    let request = protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await?;

    // Reads are frequent polling; log them quietly
    if matches!(
        request,
        Request::Status { .. } | Request::Logs { .. } | Request::GetBuild { .. } | Request::Ping
    ) {
        debug!(request = ?request, "received query");
    } else {
        info!(request = ?request, "received request");
    }

    let response = handle_request(request, ctx).await;
    debug!("Sending response: {:?}", response);

    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;
    Ok(())
}

/// Handle a single request and return a response.
pub async fn handle_request<S, C, K>(request: Request, ctx: &ListenerCtx<S, C, K>) -> Response
where
    S: BuildStore,
    C: ClusterAdapter,
    K: Clock,
{
    match request {
        Request::Ping => Response::Pong {
            version: PROTOCOL_VERSION.to_string(),
        },

        Request::Submit {
            pipeline_id,
            name,
            workflow,
            triggered_by,
            commit_sha,
            branch,
            variables,
        } => {
            let new = NewBuild {
                pipeline_id,
                name,
                triggered_by,
                commit_sha,
                branch,
                variables,
            };
            handle_submit(ctx, new, workflow).await
        }

        Request::Enqueue { message } => {
            let Some(build_id) = parse_build_message(&message) else {
                return Response::error(format!("malformed build message: {message:?}"));
            };
            match ctx.store.get_build(build_id).await {
                Ok(Some(_)) => {}
                Ok(None) => return Response::error(format!("build {build_id} not found")),
                Err(e) => return Response::error(e),
            }
            match ctx.queue.enqueue(build_id) {
                Ok(()) => Response::Queued { build_id },
                Err(e) => Response::error(e),
            }
        }

        Request::Status {
            build_id,
            job_name_prefix,
            page,
            page_size,
        } => {
            let query = StatusQuery {
                job_name_prefix,
                page,
                page_size,
            };
            match build_status(&ctx.cluster, build_id, &query).await {
                Ok(status) => Response::Status { status },
                Err(e) => Response::error(e),
            }
        }

        Request::GetBuild { build_id } => match build_detail(&ctx.store, build_id).await {
            Ok(Some(detail)) => Response::Build {
                detail: Box::new(detail),
            },
            Ok(None) => Response::error(format!("build {build_id} not found")),
            Err(e) => Response::error(e),
        },

        Request::ListBuilds {
            pipeline_id,
            page,
            page_size,
        } => match list_builds(&ctx.store, pipeline_id, page, page_size).await {
            Ok(page) => Response::Builds { page },
            Err(e) => Response::error(e),
        },

        Request::Logs {
            build_id,
            offset,
            limit,
            annotate,
        } => match build_logs(&ctx.store, build_id, offset, limit, annotate).await {
            Ok((lines, next_offset)) => Response::Logs { lines, next_offset },
            Err(e) => Response::error(e),
        },

        Request::Cancel { build_id } => {
            match cancel_build(&ctx.store, &ctx.cluster, &ctx.clock, build_id).await {
                Ok(outcome) => Response::Cancelled { outcome },
                Err(e) => Response::error(e),
            }
        }

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }
    }
}

/// Create the build row and its workflow snapshot, then queue it.
///
/// Workflow text that does not parse is rejected before anything is
/// stored. A build that cannot be queued stays pending and is picked up
/// again at the next startup.
async fn handle_submit<S, C, K>(
    ctx: &ListenerCtx<S, C, K>,
    new: NewBuild,
    workflow: String,
) -> Response
where
    S: BuildStore,
    K: Clock,
{
    if let Err(e) = parse_workflow(&workflow) {
        return Response::error(format!("parse workflow: {e}"));
    }

    let now = ctx.clock.now();
    let (pipeline_id, name) = (new.pipeline_id, new.name.clone());
    let build = match ctx.store.create_build(new, now).await {
        Ok(build) => build,
        Err(e) => return Response::error(e),
    };
    let snapshot = BuildSnapshot {
        build_id: build.id,
        pipeline_id,
        name,
        yaml_hash: yaml_hash(&workflow),
        workflow_yaml: workflow,
        created_at: now,
    };
    if let Err(e) = ctx.store.save_snapshot(snapshot).await {
        return Response::error(e);
    }

    match ctx.queue.enqueue(build.id) {
        Ok(()) => Response::Submitted { build_id: build.id },
        Err(e) => {
            warn!(build_id = %build.id, error = %e, "build created but not queued");
            Response::error(format!("build {} created but not queued: {e}", build.id))
        }
    }
}

/// Hex SHA-256 of workflow text.
pub(crate) fn yaml_hash(workflow: &str) -> String {
    format!("{:x}", Sha256::digest(workflow.as_bytes()))
}

async fn build_detail<S: BuildStore>(
    store: &S,
    build_id: BuildId,
) -> Result<Option<BuildDetail>, xci_storage::StoreError> {
    let Some(build) = store.get_build(build_id).await? else {
        return Ok(None);
    };
    let workflow = store
        .get_snapshot(build_id)
        .await?
        .map(|s| s.workflow_yaml);
    Ok(Some(BuildDetail {
        build,
        workflow,
        jobs: store.list_jobs(build_id).await?,
        steps: store.list_steps(build_id).await?,
    }))
}

/// Builds of a pipeline, newest first. Page 0 means page 1.
async fn list_builds<S: BuildStore>(
    store: &S,
    pipeline_id: u64,
    page: Option<usize>,
    page_size: Option<usize>,
) -> Result<BuildPage, xci_storage::StoreError> {
    let page = page.filter(|p| *p > 0).unwrap_or(1);
    let page_size = page_size
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_BUILD_PAGE_SIZE);

    let mut builds: Vec<_> = store
        .list_builds()
        .await?
        .into_iter()
        .filter(|b| b.pipeline_id == pipeline_id)
        .collect();
    builds.sort_by(|a, b| b.id.cmp(&a.id));

    let total_items = builds.len();
    let builds = builds
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .collect();
    Ok(BuildPage {
        builds,
        page,
        page_size,
        total_items,
        total_pages: total_items.div_ceil(page_size),
    })
}

/// Stored output lines of a build from chunk `offset`.
///
/// Returns the lines and the offset of the next unread chunk. With
/// `annotate`, a heading line precedes each run of lines from one step.
async fn build_logs<S: BuildStore>(
    store: &S,
    build_id: BuildId,
    offset: usize,
    limit: usize,
    annotate: bool,
) -> Result<(Vec<String>, usize), xci_storage::StoreError> {
    let limit = if limit == 0 { DEFAULT_LOG_LIMIT } else { limit };
    let chunks = store.list_log_chunks(build_id, offset, limit).await?;
    let next_offset = offset + chunks.len();

    if !annotate {
        return Ok((chunks.into_iter().map(|c| c.content).collect(), next_offset));
    }

    let step_names: HashMap<BuildStepId, String> = store
        .list_steps(build_id)
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();
    let mut lines = Vec::with_capacity(chunks.len());
    let mut current: Option<BuildStepId> = None;
    for chunk in chunks {
        if current != Some(chunk.build_step_id) {
            current = Some(chunk.build_step_id);
            if let Some(name) = step_names.get(&chunk.build_step_id) {
                lines.extend(format_step_log(&format!("{STEP_BEGIN} {name}")));
            }
        }
        lines.extend(format_step_log(&chunk.content));
    }
    Ok((lines, next_offset))
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
