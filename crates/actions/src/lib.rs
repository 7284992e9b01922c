// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! xci-actions: turns `uses:` steps into shell fragments.
//!
//! A reference is either served by a locally registered [`Action`] or
//! resolved remotely: the repository tarball is fetched and inspected on
//! the executor to learn how the action runs, and the emitted fragment
//! downloads the same tarball again inside the job container.

mod download;
mod download_script;
mod error;
mod metadata;
mod registry;
mod render;
mod resolver;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use download::{extract_tarball, GithubTarballSource, TarballSource, GITHUB_API};
pub use download_script::download_script;
pub use error::ActionError;
pub use metadata::{
    find_action_file, find_subdir, load_metadata, ActionKind, CompositeStep, ResolvedAction,
    WalkLimits,
};
pub use registry::{Action, ActionRegistry, ScriptAction};
pub use render::{input_exports, render_fragment};
pub use resolver::{ActionResolver, ResolverConfig};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{build_tarball, FakeFetch, FakeTarballSource};
