// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    plain      = { "42",   Some(42) },
    padded     = { " 7\n", Some(7) },
    negative   = { "-1",   None },
    not_number = { "abc",  None },
    empty      = { "",     None },
)]
fn build_id_from_str(input: &str, expected: Option<u64>) {
    let parsed: Option<BuildId> = input.parse().ok();
    assert_eq!(parsed.map(BuildId::get), expected);
}

#[test]
fn ids_serialize_as_bare_numbers() {
    let json = serde_json::to_string(&BuildStepId::new(9)).unwrap();
    assert_eq!(json, "9");
    let back: BuildStepId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, BuildStepId::new(9));
}

#[test]
fn display_is_the_number() {
    assert_eq!(BuildId::from(12).to_string(), "12");
}
