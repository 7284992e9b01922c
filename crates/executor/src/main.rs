// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! xci executor (xci-executor)
//!
//! Background process that runs queued builds on the cluster.
//!
//! Architecture:
//! - Listener Task: accepts socket requests, queues builds
//! - Consumer Task: runs each queued build through the engine
//! - Main Task: checkpoints the store and waits for shutdown

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info, warn};
use xci_actions::{ActionRegistry, ActionResolver, GithubTarballSource};
use xci_adapters::{KubeClusterAdapter, TracedCluster};
use xci_core::SystemClock;
use xci_engine::{Engine, EngineDeps};
use xci_executor::lifecycle::{self, recover_builds, save_checkpoint};
use xci_executor::{env, BuildQueue, Config, Consumer, LifecycleError, Listener, ListenerCtx};
use xci_storage::MemoryStore;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("xci-executor {VERSION}");
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("xci-executor {VERSION}");
                println!("CI workflow executor - runs queued builds as cluster jobs");
                println!();
                println!("USAGE:");
                println!("    xci-executor");
                println!();
                println!("Listens on a Unix socket under the state directory for build");
                println!("submissions, status, log and cancel requests.");
                println!();
                println!("ENVIRONMENT:");
                println!("    XCI_STATE_DIR    State directory (default ~/.local/state/xci)");
                println!("    POD_NAMESPACE    Cluster namespace (default xcoding)");
                println!("    RUST_LOG         Log filter (default info)");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: xci-executor [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    // Write startup marker to log (before tracing setup)
    write_startup_marker(&config)?;

    let log_guard = setup_logging(&config)?;

    info!("Starting executor");

    let lifecycle::StartupResult {
        mut executor,
        listener: unix_listener,
    } = match lifecycle::startup(&config).await {
        Ok(r) => r,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            eprintln!("xci-executor is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&config, &e);
            error!("Failed to start executor: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let namespace = env::namespace();
    let cluster = match KubeClusterAdapter::connect(namespace.clone()).await {
        Ok(cluster) => TracedCluster::new(cluster),
        Err(e) => {
            let e = LifecycleError::from(e);
            write_startup_error(&config, &e);
            error!("Failed to connect to cluster: {}", e);
            executor.shutdown(&SystemClock)?;
            drop(log_guard);
            return Err(e.into());
        }
    };
    info!(namespace = %namespace, "connected to cluster");

    let source = GithubTarballSource::new()?;
    let resolver = ActionResolver::new(Arc::new(source), ActionRegistry::new());

    let engine = Arc::new(Engine::new(
        EngineDeps {
            store: executor.store.clone(),
            cluster: cluster.clone(),
            resolver,
        },
        SystemClock,
        env::engine_config(),
    ));

    let (queue, queue_rx) = BuildQueue::channel(env::queue_depth());
    let consumer = tokio::spawn(Consumer::new(Arc::clone(&engine), queue_rx).run());

    // Requeue builds the previous process accepted but never started
    let recovery = recover_builds(&executor.store, &SystemClock).await?;
    if !recovery.interrupted.is_empty() {
        warn!(
            "{} build(s) were running at last shutdown and are now failed",
            recovery.interrupted.len()
        );
    }
    for build_id in recovery.requeue {
        if let Err(e) = queue.enqueue(build_id) {
            warn!(build_id = %build_id, error = %e, "could not requeue pending build");
        }
    }

    let shutdown_notify = Arc::new(Notify::new());
    let listener = Listener::new(
        unix_listener,
        ListenerCtx {
            store: executor.store.clone(),
            cluster,
            clock: SystemClock,
            queue,
            shutdown: Arc::clone(&shutdown_notify),
        },
    );
    let listener_task = tokio::spawn(listener.run());

    spawn_checkpoint(executor.store.clone(), config.snapshot_path.clone());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(
        "Executor ready, listening on {}",
        config.socket_path.display()
    );

    // Signal ready for parent process
    println!("READY");

    tokio::select! {
        _ = shutdown_notify.notified() => info!("Shutdown requested via command"),
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
    }

    // Builds still running are abandoned; the next startup fails them.
    listener_task.abort();
    consumer.abort();

    executor.shutdown(&SystemClock)?;
    info!("Executor stopped");
    Ok(())
}

/// Checkpoint interval (60 seconds)
const CHECKPOINT_INTERVAL: Duration = Duration::from_secs(60);

/// Spawn a task that periodically saves the store tables.
fn spawn_checkpoint(store: MemoryStore, snapshot_path: PathBuf) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CHECKPOINT_INTERVAL);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;

            match save_checkpoint(&store, &SystemClock, &snapshot_path) {
                Ok(size_bytes) => tracing::debug!(size_bytes, "saved checkpoint snapshot"),
                Err(e) => tracing::warn!(error = %e, "failed to save checkpoint snapshot"),
            }
        }
    });
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- xci-executor: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- xci-executor: starting (pid: ";

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file.
fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start executor: {}", error);
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config
            .log_path
            .file_name()
            .ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
