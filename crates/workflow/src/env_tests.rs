// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    simple      = { "secret://gh/token",      Some(("gh", "token")) },
    nested_key  = { "secret://db/conf/pass",  Some(("db", "conf/pass")) },
    no_key      = { "secret://gh",            None },
    empty_name  = { "secret:///token",        None },
    empty_key   = { "secret://gh/",           None },
    plain_value = { "hello",                  None },
)]
fn secret_ref_parse(value: &str, expected: Option<(&str, &str)>) {
    let parsed = SecretRef::parse(value);
    assert_eq!(
        parsed.as_ref().map(|r| (r.name.as_str(), r.key.as_str())),
        expected
    );
}

#[test]
fn malformed_secret_is_still_secret() {
    assert!(is_secret_value("secret://gh"));
    assert!(!is_secret_value("not-a-secret://x"));
}

#[test]
fn secret_prefix_ignores_surrounding_whitespace() {
    assert!(is_secret_value(" secret://a/b"));
    assert!(is_secret_value("secret://a/b\n"));
}
