// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the executor crate.

use std::sync::Arc;

use xci_actions::{ActionRegistry, ActionResolver, FakeTarballSource};
use xci_adapters::FakeClusterAdapter;
use xci_core::test_support::epoch;
use xci_core::{BuildId, BuildSnapshot, FakeClock, NewBuild};
use xci_engine::{Engine, EngineConfig, EngineDeps};
use xci_storage::{BuildStore, MemoryStore};

pub(crate) const ONE_JOB: &str = "\
name: ci
jobs:
  build:
    steps:
      - name: compile
        run: make
";

pub(crate) type TestEngine = Engine<MemoryStore, FakeClusterAdapter, FakeClock>;

pub(crate) fn engine(store: &MemoryStore, cluster: &FakeClusterAdapter) -> Arc<TestEngine> {
    Arc::new(Engine::new(
        EngineDeps {
            store: store.clone(),
            cluster: cluster.clone(),
            resolver: ActionResolver::new(
                Arc::new(FakeTarballSource::new()),
                ActionRegistry::new(),
            ),
        },
        FakeClock::at(epoch(100)),
        EngineConfig::default(),
    ))
}

/// A pending build whose snapshot holds `yaml`.
pub(crate) async fn pending_build(store: &MemoryStore, yaml: &str) -> BuildId {
    let build = store
        .create_build(NewBuild::new(1, "ci"), epoch(0))
        .await
        .unwrap();
    store
        .save_snapshot(BuildSnapshot {
            build_id: build.id,
            pipeline_id: 1,
            name: "ci".to_string(),
            workflow_yaml: yaml.to_string(),
            yaml_hash: String::new(),
            created_at: epoch(0),
        })
        .await
        .unwrap();
    build.id
}
