// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::download::extract_tarball;
use crate::metadata::{find_subdir, load_metadata, ResolvedAction, WalkLimits};
use crate::render::render_fragment;
use crate::{ActionError, ActionRegistry, TarballSource};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use xci_workflow::env::GITHUB_TOKEN;
use xci_workflow::{ActionRef, Job, Step};

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Directory the job script returns to after an action.
    pub workdir: String,
    /// Used when the job env carries no `XC_GITHUB_TOKEN`.
    pub default_token: Option<String>,
    pub walk: WalkLimits,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            workdir: "/workspace".to_string(),
            default_token: None,
            walk: WalkLimits::default(),
        }
    }
}

/// Turns `uses:` steps into shell fragments.
#[derive(Clone)]
pub struct ActionResolver {
    source: Arc<dyn TarballSource>,
    registry: Arc<ActionRegistry>,
    config: ResolverConfig,
}

impl ActionResolver {
    pub fn new(source: Arc<dyn TarballSource>, registry: ActionRegistry) -> Self {
        Self::with_config(source, registry, ResolverConfig::default())
    }

    pub fn with_config(
        source: Arc<dyn TarballSource>,
        registry: ActionRegistry,
        config: ResolverConfig,
    ) -> Self {
        Self {
            source,
            registry: Arc::new(registry),
            config,
        }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Shell fragment for a `uses:` step of `job`.
    pub async fn resolve(&self, step: &Step, job: &Job) -> Result<String, ActionError> {
        let action = ActionRef::parse(&step.uses)?;

        if let Some(local) = self.registry.get(&action.repo()) {
            debug!(action = %action, step = %step.name, "using registered action");
            return local.build(step, job);
        }

        let token = job
            .env
            .get(GITHUB_TOKEN)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| self.config.default_token.clone());

        let start = Instant::now();
        let bytes = self
            .source
            .fetch(&action, token.as_deref())
            .await
            .inspect_err(|e| warn!(action = %action, error = %e, "action download failed"))?;

        let subpath = action.path.clone();
        let walk = self.config.walk;
        let task = tokio::task::spawn_blocking(move || inspect(&bytes, subpath.as_deref(), walk));
        let resolved = task
            .await
            .map_err(|e| ActionError::Extract(e.to_string()))??;

        info!(
            action = %action,
            step = %step.name,
            kind = resolved.kind.label(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "action resolved"
        );
        Ok(render_fragment(step, &action, &resolved, &self.config.workdir))
    }
}

/// Unpack into a scratch directory and read the metadata.
fn inspect(
    bytes: &[u8],
    subpath: Option<&str>,
    walk: WalkLimits,
) -> Result<ResolvedAction, ActionError> {
    let scratch = tempfile::Builder::new().prefix("xci_action_").tempdir()?;
    extract_tarball(bytes, scratch.path())?;
    let search_root = match subpath {
        Some(sub) => find_subdir(scratch.path(), sub, walk)?,
        None => scratch.path().to_path_buf(),
    };
    load_metadata(scratch.path(), &search_root, walk)
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
