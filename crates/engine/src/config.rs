// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler tunables.

use std::time::Duration;

/// Image used when a job names no container.
pub const DEFAULT_IMAGE: &str = "alpine:latest";

/// Working directory of the runner container.
pub const WORKDIR: &str = "/workspace";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Lookups for the job's first pod after submission.
    pub pod_poll_attempts: u32,
    pub pod_poll_interval: Duration,
    /// How long the runner container may take to start.
    pub ready_timeout: Duration,
    pub ready_poll_interval: Duration,
    /// Lookups for the job's succeeded/failed counters once logs end.
    pub status_poll_attempts: u32,
    pub status_poll_interval: Duration,
    /// Log lines buffered per store write.
    pub log_batch: usize,
    pub default_image: String,
    pub workdir: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pod_poll_attempts: 30,
            pod_poll_interval: Duration::from_millis(500),
            ready_timeout: Duration::from_secs(15),
            ready_poll_interval: Duration::from_millis(300),
            status_poll_attempts: 40,
            status_poll_interval: Duration::from_millis(500),
            log_batch: 1,
            default_image: DEFAULT_IMAGE.to_string(),
            workdir: WORKDIR.to_string(),
        }
    }
}
