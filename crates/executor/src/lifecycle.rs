// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor lifecycle management: startup, recovery, checkpoints, shutdown.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};
use xci_adapters::ClusterError;
use xci_core::{BuildId, BuildStatus, Clock};
use xci_storage::{BuildStore, MemoryStore, Snapshot, SnapshotError, StoreError};

/// Executor configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/xci)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to executor log file
    pub log_path: PathBuf,
    /// Path to store checkpoint
    pub snapshot_path: PathBuf,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self::at(crate::env::state_dir()?))
    }

    /// Paths under an explicit state directory.
    pub fn at(state_dir: PathBuf) -> Self {
        Self {
            socket_path: state_dir.join("executor.sock"),
            lock_path: state_dir.join("executor.pid"),
            version_path: state_dir.join("executor.version"),
            log_path: state_dir.join("executor.log"),
            snapshot_path: state_dir.join("snapshot.json.zst"),
            state_dir,
        }
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: executor already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cluster error: {0}")]
    Cluster(#[from] ClusterError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Executor state during operation.
pub struct ExecutorState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Row store, restored from the last checkpoint
    pub store: MemoryStore,
}

/// Result of executor startup.
pub struct StartupResult {
    pub executor: ExecutorState,
    /// The Unix socket listener to spawn as a task
    pub listener: UnixListener,
}

/// Builds found unfinished in a restored store.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Recovery {
    /// Never started; queue them again.
    pub requeue: Vec<BuildId>,
    /// Were running when the previous process stopped; now failed.
    pub interrupted: Vec<BuildId>,
}

pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Don't clean up if we failed to acquire the lock: those files
            // belong to the executor that holds it.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Acquire the lock before touching anything else
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    std::fs::write(&config.version_path, crate::protocol::PROTOCOL_VERSION)?;

    let store = match Snapshot::load(&config.snapshot_path)? {
        Some(snapshot) => {
            info!(
                builds = snapshot.tables.builds.len(),
                jobs = snapshot.tables.jobs.len(),
                steps = snapshot.tables.steps.len(),
                created_at = %snapshot.created_at,
                "loaded snapshot"
            );
            MemoryStore::from_tables(snapshot.tables)
        }
        None => {
            info!("No snapshot found, starting with empty store");
            MemoryStore::new()
        }
    };

    // Remove a stale socket left by a crashed executor
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    Ok(StartupResult {
        executor: ExecutorState {
            config: config.clone(),
            lock_file,
            store,
        },
        listener,
    })
}

/// Sort unfinished builds of a restored store.
///
/// Pending builds are returned for requeueing. Running builds lost their
/// log stream with the previous process and are marked failed.
pub async fn recover_builds<S: BuildStore, K: Clock>(
    store: &S,
    clock: &K,
) -> Result<Recovery, LifecycleError> {
    let mut recovery = Recovery::default();
    for build in store.list_builds().await? {
        match build.status {
            BuildStatus::Pending => recovery.requeue.push(build.id),
            BuildStatus::Running => {
                warn!(build_id = %build.id, "build was running when the executor stopped");
                store
                    .set_build_status(build.id, BuildStatus::Failed, Some(clock.now()))
                    .await?;
                recovery.interrupted.push(build.id);
            }
            _ => {}
        }
    }
    Ok(recovery)
}

/// Write the store tables to `path`; returns the compressed size.
pub fn save_checkpoint<K: Clock>(
    store: &MemoryStore,
    clock: &K,
    path: &Path,
) -> Result<u64, SnapshotError> {
    Snapshot::new(store.tables(), clock.now()).save(path)
}

impl ExecutorState {
    pub fn shutdown<K: Clock>(&mut self, clock: &K) -> Result<(), LifecycleError> {
        info!("Shutting down executor...");

        match save_checkpoint(&self.store, clock, &self.config.snapshot_path) {
            Ok(size_bytes) => info!(size_bytes, "saved final shutdown snapshot"),
            Err(e) => warn!("Failed to save shutdown snapshot: {}", e),
        }

        for (path, what) in [
            (&self.config.socket_path, "socket"),
            (&self.config.lock_path, "PID"),
            (&self.config.version_path, "version"),
        ] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!("Failed to remove {} file: {}", what, e);
                }
            }
        }

        info!("Executor shutdown complete");
        Ok(())
    }
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    for path in [
        &config.socket_path,
        &config.version_path,
        &config.lock_path,
    ] {
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
