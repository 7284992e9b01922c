// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Locally provided actions.

use crate::render::input_exports;
use crate::ActionError;
use std::collections::HashMap;
use std::sync::Arc;
use xci_workflow::{Job, Step};

/// An action implemented by the executor itself.
pub trait Action: Send + Sync {
    /// Shell fragment for `step`.
    fn build(&self, step: &Step, job: &Job) -> Result<String, ActionError>;
}

/// Local actions keyed by `owner/name`.
///
/// Built once at startup and handed to the resolver; a registered name is
/// never fetched remotely.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, action: impl Action + 'static) -> Self {
        self.register(name, action);
        self
    }

    pub fn register(&mut self, name: impl Into<String>, action: impl Action + 'static) {
        self.actions.insert(name.into(), Arc::new(action));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}

/// Fixed shell text run with the step's `with:` inputs exported.
#[derive(Debug, Clone)]
pub struct ScriptAction {
    script: String,
}

impl ScriptAction {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl Action for ScriptAction {
    fn build(&self, step: &Step, _job: &Job) -> Result<String, ActionError> {
        let mut fragment = input_exports(&step.with);
        fragment.push_str(self.script.trim_end());
        fragment.push('\n');
        Ok(fragment)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
