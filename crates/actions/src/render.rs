// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell fragment for a remotely resolved action.

use crate::download_script::download_script;
use crate::{ActionKind, ResolvedAction};
use indexmap::IndexMap;
use std::fmt::Write as _;
use xci_script::marker::{begin_line, end_line};
use xci_script::quote::{escape_double_quoted, is_env_name, sh_quote};
use xci_script::step_command;
use xci_workflow::{ActionRef, Step};

/// Export `with:` inputs, sorted by key.
///
/// Each input is exported under its own name when that is a valid shell
/// identifier, and always as `INPUT_<KEY>` (upper-cased, `-` and spaces
/// become `_`).
pub fn input_exports(with: &IndexMap<String, String>) -> String {
    let mut keys: Vec<&String> = with.keys().collect();
    keys.sort();

    let mut b = String::new();
    for key in keys {
        let value = sh_quote(&with[key]);
        if is_env_name(key) {
            let _ = writeln!(b, "export {}={}", key, value);
        }
        let upper = key.to_ascii_uppercase().replace(['-', ' '], "_");
        let input = format!("INPUT_{upper}");
        if is_env_name(&input) {
            let _ = writeln!(b, "export {}={}", input, value);
        }
    }
    b
}

/// Full fragment: inputs, download, run, clean up.
pub fn render_fragment(
    step: &Step,
    action: &ActionRef,
    resolved: &ResolvedAction,
    workdir: &str,
) -> String {
    let mut b = input_exports(&step.with);
    b.push_str(&download_script(action));

    let rel = resolved.dir.to_string_lossy();
    let action_dir = if rel.is_empty() {
        "$workdir".to_string()
    } else {
        format!("$workdir/{}", escape_double_quoted(&rel))
    };
    let _ = writeln!(b, "echo \"action root: {}\"", action_dir);
    let _ = writeln!(b, "cd \"{}\"", action_dir);

    let label = escape_double_quoted(&step.name);
    let _ = writeln!(b, "echo \"------ running action [{}] ------\"", label);
    b.push_str(&kind_body(&resolved.kind));
    let _ = writeln!(b, "echo \"------ action [{}] finished ------\"", label);

    let _ = writeln!(b, "cd {}", sh_quote(workdir));
    b.push_str("rm -rf \"$tmpdir\"\n");
    b
}

fn kind_body(kind: &ActionKind) -> String {
    let mut b = String::new();
    match kind {
        ActionKind::Composite(steps) => {
            for (i, sub) in steps.iter().enumerate() {
                let name = match sub.name.trim() {
                    "" => format!("composite-{}", i + 1),
                    trimmed => trimmed.to_string(),
                };
                b.push_str(&begin_line(&name));
                b.push('\n');
                if !sub.run.trim().is_empty() {
                    let env = sub.scalar_env();
                    b.push_str(&step_command(
                        &name,
                        &sub.run,
                        env.iter().map(|(k, v)| (*k, v.as_str())),
                        false,
                    ));
                } else if !sub.uses.trim().is_empty() {
                    let _ = writeln!(
                        b,
                        "echo \"nested uses not yet supported: {}\"",
                        escape_double_quoted(sub.uses.trim())
                    );
                }
                b.push_str(&end_line(&name));
                b.push('\n');
            }
        }
        ActionKind::Node { main } => {
            b.push_str("if command -v node >/dev/null 2>&1; then\n");
            let _ = writeln!(b, "  node \"{}\"", escape_double_quoted(main));
            b.push_str("else\n");
            b.push_str("  echo \"node not available; please use composite or provide runtime\"\n");
            b.push_str("  exit 1\n");
            b.push_str("fi\n");
        }
        ActionKind::Docker => {
            b.push_str("echo \"docker action not supported in this runner\"\n");
        }
        ActionKind::Unknown(using) => {
            let using = escape_double_quoted(using);
            let _ = writeln!(b, "echo \"[unknown using] {using}\"");
        }
    }
    b
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
