// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::CompositeStep;
use std::path::PathBuf;

fn step(name: &str, with: &[(&str, &str)]) -> Step {
    Step {
        name: name.to_string(),
        uses: "octo/greet@v1".to_string(),
        with: with
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        ..Default::default()
    }
}

fn resolved(kind: ActionKind) -> ResolvedAction {
    ResolvedAction {
        kind,
        dir: PathBuf::new(),
    }
}

#[test]
fn inputs_are_sorted_quoted_and_prefixed() {
    let with: IndexMap<String, String> = [
        ("who-to-greet".to_string(), "Mona Lisa".to_string()),
        ("count".to_string(), "2".to_string()),
    ]
    .into_iter()
    .collect();

    assert_eq!(
        input_exports(&with),
        "export count=2\n\
         export INPUT_COUNT=2\n\
         export INPUT_WHO_TO_GREET='Mona Lisa'\n"
    );
}

#[test]
fn fragment_sections_are_ordered() {
    let step = step("greet", &[("name", "x")]);
    let action = ActionRef::parse("octo/greet@v1").unwrap();
    let fragment = render_fragment(
        &step,
        &action,
        &resolved(ActionKind::Docker),
        "/workspace",
    );

    let order = [
        "export INPUT_NAME=x",
        "tmpdir=$(mktemp -d)",
        "cd \"$workdir\"",
        "------ running action [greet] ------",
        "docker action not supported in this runner",
        "------ action [greet] finished ------",
        "cd /workspace",
        "rm -rf \"$tmpdir\"",
    ];
    let positions: Vec<usize> = order
        .iter()
        .map(|needle| fragment.find(needle).expect(needle))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", fragment);
}

#[test]
fn action_dir_follows_metadata_location() {
    let action = ActionRef::parse("github/codeql-action/init@v3").unwrap();
    let resolved = ResolvedAction {
        kind: ActionKind::Docker,
        dir: PathBuf::from("init"),
    };
    let fragment = render_fragment(&step("init", &[]), &action, &resolved, "/workspace");
    assert!(fragment.contains("cd \"$workdir/init\"\n"));
}

#[test]
fn composite_sub_steps_get_markers() {
    let kind = ActionKind::Composite(vec![
        CompositeStep {
            name: "say hi".to_string(),
            run: "echo hi".to_string(),
            ..Default::default()
        },
        CompositeStep {
            run: "echo two".to_string(),
            ..Default::default()
        },
        CompositeStep {
            uses: "actions/cache@v4".to_string(),
            ..Default::default()
        },
    ]);
    let action = ActionRef::parse("octo/greet@v1").unwrap();
    let fragment = render_fragment(&step("greet", &[]), &action, &resolved(kind), "/workspace");

    assert!(fragment.contains("echo ✔️__step_begin__ 'say hi'\n"));
    assert!(fragment.contains("echo __step_exit__ 'say hi' $code\n"));
    assert!(fragment.contains("echo __step_end__ 'say hi'\n"));
    assert!(fragment.contains("echo ✔️__step_begin__ composite-2\n"));
    assert!(fragment.contains("echo \"nested uses not yet supported: actions/cache@v4\"\n"));
    assert!(fragment.contains("echo __step_end__ composite-3\n"));
}

#[test]
fn node_body_checks_for_runtime() {
    let action = ActionRef::parse("octo/greet@v1").unwrap();
    let fragment = render_fragment(
        &step("greet", &[]),
        &action,
        &resolved(ActionKind::Node {
            main: "dist/index.js".to_string(),
        }),
        "/workspace",
    );
    assert!(fragment.contains(
        "if command -v node >/dev/null 2>&1; then\n  node \"dist/index.js\"\nelse\n"
    ));
    assert!(fragment.contains("  exit 1\nfi\n"));
}

#[test]
fn unknown_using_prints_notice() {
    let action = ActionRef::parse("octo/greet@v1").unwrap();
    let fragment = render_fragment(
        &step("greet", &[]),
        &action,
        &resolved(ActionKind::Unknown("wasm".to_string())),
        "/workspace",
    );
    assert!(fragment.contains("echo \"[unknown using] wasm\"\n"));
}
