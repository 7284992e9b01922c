// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use indexmap::IndexMap;
use k8s_openapi::api::core::v1::ResourceRequirements;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::warn;
use xci_workflow::env::{
    RESOURCE_CPU_LIMIT, RESOURCE_CPU_REQUEST, RESOURCE_MEMORY_LIMIT, RESOURCE_MEMORY_REQUEST,
};

#[allow(clippy::expect_used)]
static QUANTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+|[KMGTPE]i|[numkMGTPE])?$")
        .expect("constant regex pattern is valid")
});

/// Whether `value` is a resource quantity such as `500m`, `2`, or `1Gi`.
pub fn is_quantity(value: &str) -> bool {
    QUANTITY_RE.is_match(value)
}

/// Requests and limits from the `XC_RESOURCE_*` job-env keys.
///
/// Empty values are ignored; malformed ones are dropped with a warning.
pub fn build_resources(env: &IndexMap<String, String>) -> Option<ResourceRequirements> {
    let requests = collect(
        env,
        [("cpu", RESOURCE_CPU_REQUEST), ("memory", RESOURCE_MEMORY_REQUEST)],
    );
    let limits = collect(
        env,
        [("cpu", RESOURCE_CPU_LIMIT), ("memory", RESOURCE_MEMORY_LIMIT)],
    );
    if requests.is_none() && limits.is_none() {
        return None;
    }
    Some(ResourceRequirements {
        requests,
        limits,
        ..Default::default()
    })
}

fn collect(
    env: &IndexMap<String, String>,
    keys: [(&str, &str); 2],
) -> Option<BTreeMap<String, Quantity>> {
    let mut out = BTreeMap::new();
    for (resource, key) in keys {
        let Some(value) = env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) else {
            continue;
        };
        if !is_quantity(value) {
            warn!(key, value, "ignoring malformed resource quantity");
            continue;
        }
        out.insert(resource.to_string(), Quantity(value.to_string()));
    }
    (!out.is_empty()).then_some(out)
}
