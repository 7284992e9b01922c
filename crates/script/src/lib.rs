// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! xci-script: compiles a workflow job into one shell program and parses
//! the step markers that program prints.
//!
//! ```text
//! set -e
//! echo ✔️__step_begin__ compile
//! ... step command, then: echo __step_exit__ compile $code
//! echo __step_end__ compile
//! ```

mod builder;
pub mod marker;
pub mod quote;

pub use builder::{build_script, step_command, ActionFragment, Fragments};
pub use marker::{format_step_log, Marker, STEP_BEGIN, STEP_END, STEP_EXIT};
