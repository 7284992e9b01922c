// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Locating and reading `action.yml`.

use crate::ActionError;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Bounds on directory searches inside an unpacked action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkLimits {
    pub max_depth: usize,
    pub max_entries: usize,
}

impl Default for WalkLimits {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_entries: 10_000,
        }
    }
}

/// One step of a composite action.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompositeStep {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub run: String,
    #[serde(default)]
    pub shell: String,
    #[serde(default)]
    pub uses: String,
    #[serde(default)]
    pub env: IndexMap<String, serde_yaml::Value>,
    #[serde(default)]
    pub with: IndexMap<String, serde_yaml::Value>,
}

impl CompositeStep {
    /// Env entries with scalar values, rendered as strings.
    pub fn scalar_env(&self) -> Vec<(&str, String)> {
        self.env
            .iter()
            .filter_map(|(k, v)| {
                let value = match v {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((k.as_str(), value))
            })
            .collect()
    }
}

/// How an action runs, from `runs.using`.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    Composite(Vec<CompositeStep>),
    Node { main: String },
    Docker,
    Unknown(String),
}

impl ActionKind {
    pub fn label(&self) -> &str {
        match self {
            ActionKind::Composite(_) => "composite",
            ActionKind::Node { .. } => "node",
            ActionKind::Docker => "docker",
            ActionKind::Unknown(using) => using,
        }
    }
}

/// Metadata of an unpacked action.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAction {
    pub kind: ActionKind,
    /// Directory holding the metadata file, relative to the unpack root.
    pub dir: PathBuf,
}

#[derive(Deserialize)]
struct ActionFile {
    #[serde(default)]
    runs: RunsSection,
}

#[derive(Default, Deserialize)]
struct RunsSection {
    #[serde(default)]
    using: String,
    #[serde(default)]
    main: String,
    #[serde(default)]
    steps: Vec<CompositeStep>,
}

/// `node12`, `node16`, `node20`, ... all run as `node`.
pub(crate) fn normalize_using(using: &str) -> String {
    let using = using.trim().to_ascii_lowercase();
    match using.strip_prefix("node") {
        Some(version) if !version.is_empty() && version.chars().all(|c| c.is_ascii_digit()) => {
            "node".to_string()
        }
        _ => using,
    }
}

fn is_metadata_name(name: &std::ffi::OsStr) -> bool {
    let name = name.to_string_lossy().to_ascii_lowercase();
    name == "action.yml" || name == "action.yaml"
}

/// Find the first `action.yml`/`action.yaml` under `root`.
///
/// `root` itself is checked first; otherwise a depth-first walk in
/// file-name order returns the first match.
pub fn find_action_file(root: &Path, limits: WalkLimits) -> Result<PathBuf, ActionError> {
    for name in ["action.yml", "action.yaml"] {
        let candidate = root.join(name);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    let mut seen = 0usize;
    let walker = WalkDir::new(root)
        .max_depth(limits.max_depth)
        .follow_links(false)
        .sort_by_file_name();
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        seen += 1;
        if seen > limits.max_entries {
            return Err(ActionError::WalkLimit(limits.max_entries));
        }
        if entry.file_type().is_file() && is_metadata_name(entry.file_name()) {
            return Ok(entry.into_path());
        }
    }
    Err(ActionError::MetadataNotFound)
}

/// Locate the directory for a `uses:` subpath.
///
/// An exact `root/sub` directory wins; otherwise the first directory whose
/// path ends with `sub` is used.
pub fn find_subdir(root: &Path, sub: &str, limits: WalkLimits) -> Result<PathBuf, ActionError> {
    let sub = sub.trim_matches('/');
    let direct = root.join(sub);
    if direct.is_dir() {
        return Ok(direct);
    }

    let suffix = Path::new(sub);
    let mut seen = 0usize;
    let walker = WalkDir::new(root)
        .max_depth(limits.max_depth)
        .follow_links(false)
        .sort_by_file_name();
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        seen += 1;
        if seen > limits.max_entries {
            return Err(ActionError::WalkLimit(limits.max_entries));
        }
        if entry.file_type().is_dir() && entry.path().ends_with(suffix) {
            return Ok(entry.into_path());
        }
    }
    Err(ActionError::SubpathNotFound(sub.to_string()))
}

/// Read the metadata found under `search_root`.
///
/// The resulting [`ResolvedAction::dir`] is relative to `unpack_root`.
pub fn load_metadata(
    unpack_root: &Path,
    search_root: &Path,
    limits: WalkLimits,
) -> Result<ResolvedAction, ActionError> {
    let file = find_action_file(search_root, limits)?;
    let text = std::fs::read_to_string(&file)?;
    let parsed: ActionFile =
        serde_yaml::from_str(&text).map_err(|e| ActionError::Metadata(e.to_string()))?;

    let kind = match normalize_using(&parsed.runs.using).as_str() {
        "composite" => ActionKind::Composite(parsed.runs.steps),
        "node" => ActionKind::Node {
            main: parsed.runs.main.trim().to_string(),
        },
        "docker" => ActionKind::Docker,
        other => ActionKind::Unknown(other.to_string()),
    };

    let dir = file
        .parent()
        .and_then(|p| p.strip_prefix(unpack_root).ok())
        .map(Path::to_path_buf)
        .unwrap_or_default();

    Ok(ResolvedAction { kind, dir })
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
