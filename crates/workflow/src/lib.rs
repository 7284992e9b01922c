// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! xci-workflow: workflow YAML model, parser, and dependency graph

mod dag;
pub mod env;
mod model;
mod parser;
mod uses;

pub use dag::Dag;
pub use env::SecretRef;
pub use model::{Job, Needs, Step, Workflow};
pub use parser::{parse_workflow, ParseError};
pub use uses::{ActionRef, UsesError};
