// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment-variable conventions recognized in job and step env.

pub const RESOURCE_CPU_REQUEST: &str = "XC_RESOURCE_CPU_REQUEST";
pub const RESOURCE_MEMORY_REQUEST: &str = "XC_RESOURCE_MEMORY_REQUEST";
pub const RESOURCE_CPU_LIMIT: &str = "XC_RESOURCE_CPU_LIMIT";
pub const RESOURCE_MEMORY_LIMIT: &str = "XC_RESOURCE_MEMORY_LIMIT";

/// Per-job wall-clock limit in seconds; positive values only.
pub const JOB_TIMEOUT_SECONDS: &str = "XC_JOB_TIMEOUT_SECONDS";

/// Seconds a finished workload is kept before the cluster removes it.
pub const JOB_TTL_SECONDS: &str = "XC_JOB_TTL_SECONDS";

/// Token used to download action tarballs.
pub const GITHUB_TOKEN: &str = "XC_GITHUB_TOKEN";

/// Step-level flag equivalent to `continue-on-error: true`.
pub const CONTINUE_ON_ERROR: &str = "XC_CONTINUE_ON_ERROR";

pub const SECRET_PREFIX: &str = "secret://";

/// Values with the secret prefix never appear in generated scripts.
pub fn is_secret_value(value: &str) -> bool {
    value.trim().starts_with(SECRET_PREFIX)
}

/// A `secret://<name>/<key>` reference to a cluster secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    pub name: String,
    pub key: String,
}

impl SecretRef {
    /// Returns `None` unless both name and key are present.
    pub fn parse(value: &str) -> Option<Self> {
        let rest = value.strip_prefix(SECRET_PREFIX)?;
        let (name, key) = rest.split_once('/')?;
        if name.is_empty() || key.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            key: key.to_string(),
        })
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
