// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! xci-core: ids, status enums and persisted row models shared by the
//! workflow executor crates.

pub mod build;
pub mod clock;
pub mod id;
pub mod job;
pub mod status;
pub mod step;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use build::{Build, BuildSnapshot, NewBuild};
pub use clock::{Clock, SystemClock};
pub use id::{BuildId, BuildJobId, BuildStepId};
pub use job::{BuildJob, BuildJobEdge, JobUpdate, NewBuildJob};
pub use status::{BuildStatus, JobStatus, ParseStatusError, StepStatus};
pub use step::{BuildStep, BuildStepLogChunk, NewBuildStep, NewLogChunk, StepUpdate};

#[cfg(any(test, feature = "test-support"))]
pub use clock::FakeClock;
