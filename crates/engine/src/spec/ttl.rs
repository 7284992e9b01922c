// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use indexmap::IndexMap;
use tracing::warn;
use xci_workflow::env::{JOB_TIMEOUT_SECONDS, JOB_TTL_SECONDS};

/// Finished workloads are removed after an hour unless configured.
pub const DEFAULT_TTL_SECONDS: i32 = 3600;

/// `ttlSecondsAfterFinished` from `XC_JOB_TTL_SECONDS`.
///
/// Absent or empty: the default. Zero or negative: no TTL, the workload is
/// kept. Unparseable: the default, with a warning.
pub fn ttl_seconds(env: &IndexMap<String, String>) -> Option<i32> {
    let raw = env.get(JOB_TTL_SECONDS).map(|v| v.trim());
    let Some(raw) = raw.filter(|v| !v.is_empty()) else {
        return Some(DEFAULT_TTL_SECONDS);
    };
    match raw.parse::<i64>() {
        Ok(secs) if secs <= 0 => None,
        Ok(secs) => Some(i32::try_from(secs).unwrap_or(i32::MAX)),
        Err(_) => {
            warn!(value = raw, "invalid {}, using default", JOB_TTL_SECONDS);
            Some(DEFAULT_TTL_SECONDS)
        }
    }
}

/// `activeDeadlineSeconds` from `XC_JOB_TIMEOUT_SECONDS`; positive values only.
pub fn active_deadline_seconds(env: &IndexMap<String, String>) -> Option<i64> {
    env.get(JOB_TIMEOUT_SECONDS)
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|secs| *secs > 0)
}
