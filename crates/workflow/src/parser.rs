// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow parsing and validation

use crate::{ActionRef, UsesError, Workflow};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during workflow parsing
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid workflow at {location}: {message}")]
    Invalid { location: String, message: String },

    #[error("invalid action reference at {location}: {source}")]
    Uses {
        location: String,
        #[source]
        source: UsesError,
    },
}

fn invalid(location: String, message: impl Into<String>) -> ParseError {
    ParseError::Invalid {
        location,
        message: message.into(),
    }
}

/// Parse and validate a workflow document.
pub fn parse_workflow(content: &str) -> Result<Workflow, ParseError> {
    // 1. Serde does the heavy lifting
    let mut workflow: Workflow = serde_yaml::from_str(content)?;

    // 2. Name fixup: trim names and fill in positional defaults
    for job in workflow.jobs.values_mut() {
        for (i, step) in job.steps.iter_mut().enumerate() {
            let trimmed = step.name.trim();
            step.name = if trimmed.is_empty() {
                format!("step-{}", i + 1)
            } else {
                trimmed.to_string()
            };
        }
    }

    // 3. Validation
    for (job_name, job) in &workflow.jobs {
        if job_name.trim().is_empty() {
            return Err(invalid("jobs".to_string(), "job name must not be empty"));
        }

        for need in job.needs.iter() {
            if !workflow.jobs.contains_key(need) {
                return Err(invalid(
                    format!("jobs.{}.needs", job_name),
                    format!("unknown job `{}`", need),
                ));
            }
        }

        let mut seen = HashSet::new();
        for (i, step) in job.steps.iter().enumerate() {
            let location = format!("jobs.{}.steps[{}]({})", job_name, i, step.name);

            if step.name.contains(['\n', '\r']) {
                return Err(invalid(location, "step name must be a single line"));
            }
            if !seen.insert(step.name.as_str()) {
                return Err(invalid(location, "duplicate step name within job"));
            }

            let has_run = !step.run.trim().is_empty();
            match (has_run, step.has_uses()) {
                (true, true) => {
                    return Err(invalid(location, "`run` and `uses` are mutually exclusive"));
                }
                (false, false) => {
                    return Err(invalid(location, "step needs either `run` or `uses`"));
                }
                (false, true) => {
                    ActionRef::parse(&step.uses)
                        .map_err(|source| ParseError::Uses { location, source })?;
                }
                (true, false) => {}
            }
        }
    }

    Ok(workflow)
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
