// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job script assembly.

use crate::marker::{begin_line, end_line, exit_line};
use crate::quote::{escape_double_quoted, is_env_name, sh_quote};
use std::collections::HashMap;
use std::fmt::Write as _;
use xci_workflow::Job;

/// Pre-resolved shell text for a `uses:` step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionFragment {
    Script(String),
    /// Resolution failed; the step prints the message and fails.
    Error(String),
}

/// Action fragments keyed by step name.
pub type Fragments = HashMap<String, ActionFragment>;

/// Compile a job into one shell program.
///
/// Every step is bracketed by begin/end markers. Steps with `uses:` take
/// their body from `fragments`; a missing entry counts as a resolution
/// failure.
pub fn build_script(job: &Job, fragments: &Fragments) -> String {
    let mut script = String::from("set -e\n");

    for step in &job.steps {
        script.push_str(&begin_line(&step.name));
        script.push('\n');

        if step.has_uses() {
            match fragments.get(&step.name) {
                Some(ActionFragment::Script(fragment)) => {
                    script.push_str(&step_command(
                        &step.name,
                        fragment,
                        std::iter::empty(),
                        step.continues_on_error(),
                    ));
                }
                Some(ActionFragment::Error(message)) => {
                    script.push_str(&action_error(&step.name, message));
                }
                None => {
                    script.push_str(&action_error(&step.name, "action was not resolved"));
                }
            }
        } else {
            script.push_str(&step_command(
                &step.name,
                &step.run,
                step.plain_env(),
                step.continues_on_error(),
            ));
        }

        script.push_str(&end_line(&step.name));
        script.push('\n');
    }

    script
}

/// Wrap one step's shell text so its exit code is reported.
///
/// The body runs in a subshell with `set -e`, so its env exports and
/// working-directory changes stay local to the step. The exit marker is
/// printed whatever the outcome. Unless `continue_on_error` is set, a
/// nonzero code then aborts the job script with that code.
///
/// Env keys that are not valid shell identifiers are left out.
pub fn step_command<'a>(
    step_name: &str,
    body: &str,
    env: impl IntoIterator<Item = (&'a str, &'a str)>,
    continue_on_error: bool,
) -> String {
    let mut out = String::from("set +e\n(\nset -e\n");
    for (key, value) in env {
        if is_env_name(key) {
            let _ = writeln!(out, "export {}={}", key, sh_quote(value));
        }
    }
    let body = body.trim_end();
    out.push_str(if body.is_empty() { ":" } else { body });
    out.push_str("\n)\ncode=$?\nset -e\n");
    out.push_str(&exit_line(step_name, "code"));
    out.push('\n');
    if !continue_on_error {
        out.push_str("if [ $code -ne 0 ]; then exit $code; fi\n");
    }
    out
}

fn action_error(step_name: &str, message: &str) -> String {
    format!(
        "echo \"action error: {}\"\ncode=1\n{}\nexit 1\n",
        escape_double_quoted(message),
        exit_line(step_name, "code")
    )
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
