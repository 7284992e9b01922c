// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `uses:` references: `owner/name[/subpath]@version`.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static USES_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)(/[A-Za-z0-9_./-]+)?@([A-Za-z0-9_.-]+)$")
        .expect("constant regex pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{0}` is not of the form owner/name[/path]@version")]
pub struct UsesError(pub String);

/// A parsed action reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionRef {
    pub owner: String,
    pub name: String,
    /// Directory inside the repository, without leading or trailing slashes.
    pub path: Option<String>,
    pub version: String,
}

impl ActionRef {
    pub fn parse(uses: &str) -> Result<Self, UsesError> {
        let trimmed = uses.trim();
        let caps = USES_PATTERN
            .captures(trimmed)
            .ok_or_else(|| UsesError(trimmed.to_string()))?;
        let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or_default();
        let path = caps
            .get(3)
            .map(|m| m.as_str().trim_matches('/').to_string())
            .filter(|p| !p.is_empty());
        if path
            .as_deref()
            .is_some_and(|p| p.split('/').any(|seg| seg == ".."))
        {
            return Err(UsesError(trimmed.to_string()));
        }
        Ok(Self {
            owner: group(1).to_string(),
            name: group(2).to_string(),
            path,
            version: group(4).to_string(),
        })
    }

    /// `owner/name`, the key used by the action registry.
    pub fn repo(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)?;
        if let Some(path) = &self.path {
            write!(f, "/{}", path)?;
        }
        write!(f, "@{}", self.version)
    }
}

#[cfg(test)]
#[path = "uses_tests.rs"]
mod tests;
