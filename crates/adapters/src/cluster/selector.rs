// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Equality-based label selectors.

use std::collections::BTreeMap;

/// Render `pairs` as `k=v,k2=v2`.
pub fn label_selector<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Whether `labels` satisfies every `k=v` term of `selector`.
///
/// An empty selector matches everything. Terms without `=` never match.
pub fn matches_selector(selector: &str, labels: Option<&BTreeMap<String, String>>) -> bool {
    selector
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .all(|term| match term.split_once('=') {
            Some((key, value)) => labels
                .and_then(|l| l.get(key.trim()))
                .is_some_and(|v| v == value.trim()),
            None => false,
        })
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;
