// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build queue and the consumer that runs queued builds.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use xci_adapters::ClusterAdapter;
use xci_core::{BuildId, Clock};
use xci_engine::Engine;
use xci_storage::BuildStore;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("build queue is full")]
    Full,
    #[error("build queue is closed")]
    Closed,
}

/// Build id carried by a queue message body `"<build_id>|…"`.
///
/// Fields after the first `|` are ignored.
pub fn parse_build_message(body: &str) -> Option<BuildId> {
    let head = body.split('|').next()?.trim();
    match head.parse::<BuildId>() {
        Ok(id) if id.get() > 0 => Some(id),
        _ => None,
    }
}

/// Sending half of the bounded build queue.
#[derive(Debug, Clone)]
pub struct BuildQueue {
    tx: mpsc::Sender<BuildId>,
}

impl BuildQueue {
    pub fn channel(depth: usize) -> (Self, mpsc::Receiver<BuildId>) {
        let (tx, rx) = mpsc::channel(depth.max(1));
        (Self { tx }, rx)
    }

    /// Queue a build without waiting for room.
    pub fn enqueue(&self, build_id: BuildId) -> Result<(), QueueError> {
        self.tx.try_send(build_id).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })
    }
}

/// Runs each queued build in its own task.
pub struct Consumer<S, C, K> {
    engine: Arc<Engine<S, C, K>>,
    rx: mpsc::Receiver<BuildId>,
}

impl<S, C, K> Consumer<S, C, K>
where
    S: BuildStore,
    C: ClusterAdapter,
    K: Clock,
{
    pub fn new(engine: Arc<Engine<S, C, K>>, rx: mpsc::Receiver<BuildId>) -> Self {
        Self { engine, rx }
    }

    /// Consume until every [`BuildQueue`] is dropped, then wait for the
    /// builds still running.
    pub async fn run(mut self) {
        let mut running = JoinSet::new();
        loop {
            tokio::select! {
                next = self.rx.recv() => match next {
                    Some(build_id) => {
                        info!(build_id = %build_id, "build dequeued");
                        running.spawn(run_one(Arc::clone(&self.engine), build_id));
                    }
                    None => break,
                },
                Some(joined) = running.join_next(), if !running.is_empty() => {
                    reap(joined);
                }
            }
        }
        while let Some(joined) = running.join_next().await {
            reap(joined);
        }
        info!("build queue closed");
    }
}

async fn run_one<S, C, K>(engine: Arc<Engine<S, C, K>>, build_id: BuildId)
where
    S: BuildStore,
    C: ClusterAdapter,
    K: Clock,
{
    match engine.run_build(build_id).await {
        Ok(status) => info!(build_id = %build_id, status = %status, "build finished"),
        Err(e) => error!(build_id = %build_id, error = %e, "build did not run"),
    }
}

fn reap(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        warn!(error = %e, "build task panicked");
    }
}

#[cfg(test)]
#[path = "consumer_tests.rs"]
mod tests;
