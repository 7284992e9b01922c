// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    bare        = { "compile",        "compile" },
    path        = { "./a/b.txt",      "./a/b.txt" },
    version     = { "v1.2.3",         "v1.2.3" },
    empty       = { "",               "''" },
    space       = { "two words",      "'two words'" },
    dollar      = { "$HOME",          "'$HOME'" },
    apostrophe  = { "it's",           "'it'\\''s'" },
    newline     = { "a\nb",           "'a\nb'" },
)]
fn quotes(input: &str, expected: &str) {
    assert_eq!(sh_quote(input), expected);
}

#[yare::parameterized(
    plain     = { "hello",         "hello" },
    dollar    = { "cost $5",       "cost \\$5" },
    backtick  = { "`id`",          "\\`id\\`" },
    quote     = { "say \"hi\"",    "say \\\"hi\\\"" },
    backslash = { "a\\b",          "a\\\\b" },
    newline   = { "line1\nline2",  "line1 line2" },
)]
fn escapes_double_quoted(input: &str, expected: &str) {
    assert_eq!(escape_double_quoted(input), expected);
}

#[yare::parameterized(
    upper      = { "PATH",     true },
    underscore = { "_x1",      true },
    digit      = { "1ABC",     false },
    dash       = { "MY-VAR",   false },
    empty      = { "",         false },
)]
fn env_names(name: &str, expected: bool) {
    assert_eq!(is_env_name(name), expected);
}
