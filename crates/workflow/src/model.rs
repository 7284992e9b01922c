// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow, job, and step definitions as written in YAML.

use crate::env;
use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// A parsed workflow document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default)]
    pub name: String,
    /// Applies to every job; job-level values win.
    #[serde(default, deserialize_with = "string_map")]
    pub env: IndexMap<String, String>,
    #[serde(default)]
    pub jobs: IndexMap<String, Job>,
}

impl Workflow {
    /// Jobs with the workflow-level env merged underneath each job's env.
    pub fn merged_jobs(&self) -> IndexMap<String, Job> {
        self.jobs
            .iter()
            .map(|(name, job)| {
                let mut merged = job.clone();
                let mut env = self.env.clone();
                for (key, value) in &job.env {
                    env.insert(key.clone(), value.clone());
                }
                merged.env = env;
                (name.clone(), merged)
            })
            .collect()
    }
}

/// One job: a single cluster workload running its steps in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub needs: Needs,
    /// Container image; the executor's default image when absent.
    #[serde(default, deserialize_with = "container_image")]
    pub container: Option<String>,
    #[serde(default, deserialize_with = "string_map")]
    pub env: IndexMap<String, String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Job {
    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub run: String,
    #[serde(default)]
    pub uses: String,
    #[serde(default, deserialize_with = "string_map")]
    pub with: IndexMap<String, String>,
    #[serde(default, deserialize_with = "string_map")]
    pub env: IndexMap<String, String>,
    #[serde(default, rename = "continue-on-error")]
    pub continue_on_error: bool,
}

impl Step {
    pub fn has_uses(&self) -> bool {
        !self.uses.trim().is_empty()
    }

    /// Explicit `continue-on-error`, or the `XC_CONTINUE_ON_ERROR=true` env flag.
    pub fn continues_on_error(&self) -> bool {
        self.continue_on_error
            || self
                .env
                .get(env::CONTINUE_ON_ERROR)
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// Step env entries that are safe to place in the script.
    pub fn plain_env(&self) -> impl Iterator<Item = (&str, &str)> {
        self.env
            .iter()
            .filter(|(_, v)| !env::is_secret_value(v))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Jobs that must succeed before this one starts.
///
/// Accepts a list or a single whitespace-delimited string:
///   `needs: [build, lint]`
///   `needs: "build lint"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Needs(pub Vec<String>);

impl Needs {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NeedsRaw {
    List(Vec<String>),
    Single(String),
}

impl<'de> Deserialize<'de> for Needs {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = Option::<NeedsRaw>::deserialize(d)?;
        Ok(match raw {
            None => Needs::default(),
            Some(NeedsRaw::List(list)) => Needs(list),
            Some(NeedsRaw::Single(s)) => Needs(s.split_whitespace().map(String::from).collect()),
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ContainerRaw {
    Image(String),
    Spec { image: String },
}

fn container_image<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<ContainerRaw>::deserialize(d)?;
    Ok(raw
        .map(|c| match c {
            ContainerRaw::Image(image) | ContainerRaw::Spec { image } => image,
        })
        .filter(|image| !image.trim().is_empty()))
}

/// Maps whose values may be written as any YAML scalar.
fn string_map<'de, D: Deserializer<'de>>(d: D) -> Result<IndexMap<String, String>, D::Error> {
    let raw = Option::<IndexMap<String, serde_yaml::Value>>::deserialize(d)?;
    raw.unwrap_or_default()
        .into_iter()
        .map(|(key, value)| match scalar_to_string(value) {
            Some(s) => Ok((key, s)),
            None => Err(D::Error::custom(format!(
                "value for `{}` must be a string, number, or boolean",
                key
            ))),
        })
        .collect()
}

fn scalar_to_string(value: serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Null => Some(String::new()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
