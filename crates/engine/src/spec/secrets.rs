// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use k8s_openapi::api::core::v1::{EnvVar, EnvVarSource, SecretKeySelector};
use std::collections::BTreeMap;
use xci_workflow::env::is_secret_value;
use xci_workflow::{Job, SecretRef};

/// Container env for `job`.
///
/// Every job env entry is passed through; step env entries are included
/// only when they are secret references, since plain step env is inlined
/// in the script. A step secret overrides a job entry with the same key.
/// `secret://<name>/<key>` becomes a secret key reference; a malformed
/// reference is passed as a literal value.
pub fn build_env_vars(job: &Job) -> Vec<EnvVar> {
    let mut merged: BTreeMap<&str, &str> = job
        .env
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    for step in &job.steps {
        for (key, value) in &step.env {
            if is_secret_value(value) {
                merged.insert(key.as_str(), value.as_str());
            }
        }
    }

    merged
        .into_iter()
        .map(|(name, value)| match SecretRef::parse(value.trim()) {
            Some(secret) => EnvVar {
                name: name.to_string(),
                value_from: Some(EnvVarSource {
                    secret_key_ref: Some(SecretKeySelector {
                        name: secret.name,
                        key: secret.key,
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
            None => EnvVar {
                name: name.to_string(),
                value: Some(value.to_string()),
                ..Default::default()
            },
        })
        .collect()
}
