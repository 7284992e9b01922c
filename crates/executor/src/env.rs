// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the executor crate.

use std::path::PathBuf;
use std::time::Duration;

use xci_engine::EngineConfig;

use crate::lifecycle::LifecycleError;

/// Namespace used when `POD_NAMESPACE` is unset.
pub const DEFAULT_NAMESPACE: &str = "xcoding";

/// Builds buffered between the socket and the consumer.
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

/// Resolve state directory: XCI_STATE_DIR > XDG_STATE_HOME/xci > ~/.local/state/xci
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("XCI_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("xci"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/xci"))
}

/// Cluster namespace jobs are submitted to.
pub fn namespace() -> String {
    std::env::var("POD_NAMESPACE")
        .ok()
        .map(|ns| ns.trim().to_string())
        .filter(|ns| !ns.is_empty())
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
}

pub fn queue_depth() -> usize {
    parsed::<usize>("XCI_QUEUE_DEPTH")
        .filter(|depth| *depth > 0)
        .unwrap_or(DEFAULT_QUEUE_DEPTH)
}

/// Scheduler tunables, production defaults overridden from the environment.
pub fn engine_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    if let Some(batch) = parsed::<usize>("XCI_LOG_BATCH") {
        config.log_batch = batch.max(1);
    }
    if let Some(interval) = millis("XCI_POD_POLL_MS") {
        config.pod_poll_interval = interval;
    }
    if let Some(timeout) = millis("XCI_READY_TIMEOUT_MS") {
        config.ready_timeout = timeout;
    }
    if let Some(interval) = millis("XCI_STATUS_POLL_MS") {
        config.status_poll_interval = interval;
    }
    config
}

fn parsed<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.trim().parse::<T>().ok())
}

fn millis(var: &str) -> Option<Duration> {
    parsed::<u64>(var).map(Duration::from_millis)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
