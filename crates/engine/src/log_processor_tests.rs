// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{seeded_store, step_named};
use std::time::Duration;
use xci_core::test_support::epoch;
use xci_core::FakeClock;
use xci_storage::MemoryStore;

async fn processor(
    batch: usize,
) -> (LogProcessor<MemoryStore, FakeClock>, MemoryStore, FakeClock, BuildId) {
    let (store, build_id, _) = seeded_store(&[("compile", &["checkout", "make"])]).await;
    let clock = FakeClock::at(epoch(100));
    let processor = LogProcessor::new(store.clone(), clock.clone(), build_id, "compile", batch);
    (processor, store, clock, build_id)
}

async fn feed(processor: &mut LogProcessor<MemoryStore, FakeClock>, lines: &[&str]) {
    for line in lines {
        processor.on_line(line).await;
    }
    processor.finish().await;
}

#[tokio::test]
async fn markers_drive_step_rows() {
    let (mut p, store, clock, build_id) = processor(1).await;

    p.on_line("✔️__step_begin__ checkout").await;
    let row = step_named(&store, build_id, "compile", "checkout").await;
    assert_eq!(row.status, StepStatus::Running);
    assert_eq!(row.started_at, Some(epoch(100)));
    assert!(p.current_step().is_some());

    clock.advance(Duration::from_secs(5));
    p.on_line("__step_exit__ checkout 0").await;
    p.on_line("__step_end__ checkout").await;
    let row = step_named(&store, build_id, "compile", "checkout").await;
    assert_eq!(row.status, StepStatus::Succeeded);
    assert_eq!(row.exit_code, Some(0));
    assert_eq!(row.finished_at, Some(epoch(105)));
    assert!(p.current_step().is_none());

    let untouched = step_named(&store, build_id, "compile", "make").await;
    assert_eq!(untouched.status, StepStatus::Pending);
}

#[tokio::test]
async fn plain_lines_attach_to_current_step() {
    let (mut p, store, _clock, build_id) = processor(1).await;
    feed(
        &mut p,
        &[
            "preamble is dropped",
            "✔️__step_begin__ checkout",
            "  cloning repo  ",
            "__step_exit__ checkout 0",
            "__step_end__ checkout",
            "between steps is dropped",
            "✔️__step_begin__ make",
            "cc -o app",
        ],
    )
    .await;

    let checkout = step_named(&store, build_id, "compile", "checkout").await;
    let make = step_named(&store, build_id, "compile", "make").await;
    let chunks = store.list_log_chunks(build_id, 0, 100).await.unwrap();
    let rendered: Vec<_> = chunks
        .iter()
        .map(|c| (c.build_step_id, c.content.as_str()))
        .collect();
    assert_eq!(
        rendered,
        vec![(checkout.id, "  cloning repo  "), (make.id, "cc -o app")]
    );
}

#[tokio::test]
async fn batched_output_is_written_before_the_next_marker() {
    let (mut p, store, _clock, build_id) = processor(10).await;
    p.on_line("✔️__step_begin__ checkout").await;
    p.on_line("one").await;
    p.on_line("two").await;
    let chunks = store.list_log_chunks(build_id, 0, 10).await.unwrap();
    assert!(chunks.is_empty());

    p.on_line("__step_end__ checkout").await;
    assert_eq!(
        store.list_log_chunks(build_id, 0, 10).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn finish_flushes_trailing_output() {
    let (mut p, store, _clock, build_id) = processor(10).await;
    feed(&mut p, &["✔️__step_begin__ make", "partial"]).await;
    assert_eq!(
        store.list_log_chunks(build_id, 0, 10).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn nonzero_exit_code_is_recorded() {
    let (mut p, store, _clock, build_id) = processor(1).await;
    feed(&mut p, &["✔️__step_begin__ make", "__step_exit__ make 2"]).await;
    let row = step_named(&store, build_id, "compile", "make").await;
    assert_eq!(row.exit_code, Some(2));
    assert_eq!(row.status, StepStatus::Running);
}

#[tokio::test]
async fn unparseable_exit_code_is_ignored() {
    let (mut p, store, _clock, build_id) = processor(1).await;
    feed(
        &mut p,
        &["✔️__step_begin__ make", "__step_exit__ make oops"],
    )
    .await;
    let row = step_named(&store, build_id, "compile", "make").await;
    assert_eq!(row.exit_code, None);
}

#[tokio::test]
async fn unknown_step_markers_outside_a_step_are_ignored() {
    let (mut p, store, _clock, build_id) = processor(1).await;
    feed(
        &mut p,
        &["✔️__step_begin__ ghost", "orphan output", "__step_end__ ghost"],
    )
    .await;
    assert!(p.current_step().is_none());
    let chunks = store.list_log_chunks(build_id, 0, 10).await.unwrap();
    assert!(chunks.is_empty());
}

#[tokio::test]
async fn composite_sub_step_output_stays_with_enclosing_step() {
    let (mut p, store, _clock, build_id) = processor(1).await;
    feed(
        &mut p,
        &[
            "✔️__step_begin__ make",
            "downloading action",
            "✔️__step_begin__ composite-1",
            "composite says hi",
            "__step_exit__ composite-1 0",
            "__step_end__ composite-1",
            "after composite",
            "__step_exit__ make 0",
            "__step_end__ make",
        ],
    )
    .await;

    let make = step_named(&store, build_id, "compile", "make").await;
    assert_eq!(make.status, StepStatus::Succeeded);
    assert_eq!(make.exit_code, Some(0));
    let chunks = store.list_log_chunks(build_id, 0, 100).await.unwrap();
    let contents: Vec<_> = chunks
        .iter()
        .map(|c| (c.build_step_id, c.content.as_str()))
        .collect();
    assert_eq!(
        contents,
        vec![
            (make.id, "downloading action"),
            (make.id, "composite says hi"),
            (make.id, "after composite"),
        ]
    );
    assert!(p.current_step().is_none());
}

#[tokio::test]
async fn end_of_other_step_keeps_current() {
    let (mut p, store, _clock, build_id) = processor(1).await;
    p.on_line("✔️__step_begin__ make").await;
    p.on_line("__step_end__ checkout").await;
    let make = step_named(&store, build_id, "compile", "make").await;
    assert_eq!(p.current_step(), Some(make.id));
}
