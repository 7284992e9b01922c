// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step marker protocol.
//!
//! The job script announces step boundaries on stdout; everything else
//! the script prints is step output.

use crate::quote::sh_quote;

pub const STEP_BEGIN: &str = "✔️__step_begin__";
pub const STEP_END: &str = "__step_end__";
pub const STEP_EXIT: &str = "__step_exit__";

/// One line of job output, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker<'a> {
    Begin { step: &'a str },
    End { step: &'a str },
    /// `code` is `None` when the line carries no parseable exit code.
    Exit {
        step: &'a str,
        code: Option<i32>,
    },
    /// Ordinary output, untouched.
    Plain(&'a str),
}

impl<'a> Marker<'a> {
    pub fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        if let Some(step) = tagged(trimmed, STEP_BEGIN) {
            return Marker::Begin { step };
        }
        if let Some(step) = tagged(trimmed, STEP_END) {
            return Marker::End { step };
        }
        if let Some(rest) = tagged(trimmed, STEP_EXIT) {
            return match rest.rsplit_once(char::is_whitespace) {
                Some((step, code)) => Marker::Exit {
                    step: step.trim_end(),
                    code: code.parse().ok(),
                },
                None => Marker::Exit {
                    step: rest,
                    code: None,
                },
            };
        }
        Marker::Plain(line)
    }

    pub fn is_marker(&self) -> bool {
        !matches!(self, Marker::Plain(_))
    }
}

/// Payload after `tag` and a separating space, if any.
fn tagged<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(tag)?.strip_prefix(char::is_whitespace)?;
    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}

/// Shell line printing a begin marker.
pub fn begin_line(step: &str) -> String {
    format!("echo {} {}", STEP_BEGIN, sh_quote(step))
}

/// Shell line printing an end marker.
pub fn end_line(step: &str) -> String {
    format!("echo {} {}", STEP_END, sh_quote(step))
}

/// Shell line printing an exit marker with the code held in `$code_var`.
pub fn exit_line(step: &str, code_var: &str) -> String {
    format!("echo {} {} ${}", STEP_EXIT, sh_quote(step), code_var)
}

/// Render a raw output line for humans.
///
/// Begin markers become a status line; end and exit markers are hidden.
pub fn format_step_log(line: &str) -> Option<String> {
    match Marker::parse(line) {
        Marker::Begin { step } => Some(format!("🔹 Step [{}] Running", step)),
        Marker::End { .. } | Marker::Exit { .. } => None,
        Marker::Plain(text) => Some(text.to_string()),
    }
}

#[cfg(test)]
#[path = "marker_tests.rs"]
mod tests;
