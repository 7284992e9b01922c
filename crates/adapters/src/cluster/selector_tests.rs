// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn labels() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app".to_string(), "ci-executor-build".to_string()),
        ("xcoding.io/build-id".to_string(), "42".to_string()),
    ])
}

#[yare::parameterized(
    empty = { "", true },
    single = { "app=ci-executor-build", true },
    both = { "app=ci-executor-build,xcoding.io/build-id=42", true },
    spaced = { " xcoding.io/build-id = 42 ", true },
    wrong_value = { "xcoding.io/build-id=43", false },
    missing_key = { "job-name=x", false },
    bare_key = { "app", false },
)]
fn selector_matching(selector: &str, expected: bool) {
    assert_eq!(matches_selector(selector, Some(&labels())), expected);
}

#[test]
fn no_labels_only_match_empty_selector() {
    assert!(matches_selector("", None));
    assert!(!matches_selector("app=x", None));
}

#[test]
fn selector_rendering() {
    assert_eq!(
        label_selector([("app", "ci-executor-build"), ("xcoding.io/build-id", "7")]),
        "app=ci-executor-build,xcoding.io/build-id=7"
    );
    assert_eq!(label_selector(std::iter::empty()), "");
}
