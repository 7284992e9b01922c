// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell quoting helpers for generated scripts.

/// Quote `s` as a single shell word.
///
/// Words made only of unambiguous characters are returned bare; anything
/// else is single-quoted with embedded quotes spliced as `'\''`.
pub fn sh_quote(s: &str) -> String {
    if !s.is_empty() && s.chars().all(is_bare_char) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

fn is_bare_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '_' | '-' | '.' | '/' | ':' | '@' | '%' | '+' | '=' | ',')
}

/// Escape a string for use inside a double-quoted shell string.
///
/// - Backslash `\` → `\\`
/// - Dollar sign `$` → `\$`
/// - Backtick `` ` `` → `` \` ``
/// - Double quote `"` → `\"`
pub fn escape_double_quoted(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '$' => result.push_str("\\$"),
            '`' => result.push_str("\\`"),
            '"' => result.push_str("\\\""),
            '\n' | '\r' => result.push(' '),
            _ => result.push(c),
        }
    }
    result
}

/// Whether `name` can be assigned or exported by a POSIX shell.
pub fn is_env_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
#[path = "quote_tests.rs"]
mod tests;
