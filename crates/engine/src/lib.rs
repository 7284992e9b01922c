// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! xci-engine: schedules workflow jobs onto the cluster and tracks their
//! progress in the build store.

mod cancel;
mod config;
mod engine;
mod error;
mod log_batcher;
mod log_processor;
pub mod naming;
mod pods;
mod rows;
mod scheduler;
pub mod spec;
mod status;

#[cfg(test)]
mod test_helpers;

pub use cancel::{cancel_build, CancelOutcome};
pub use config::{EngineConfig, DEFAULT_IMAGE, WORKDIR};
pub use engine::{compute_build_status, Engine, EngineDeps};
pub use error::{EngineError, JobError};
pub use log_batcher::LogBatcher;
pub use log_processor::LogProcessor;
pub use naming::cluster_job_name;
pub use rows::init_build_rows;
pub use scheduler::JobScheduler;
pub use status::{
    build_status, JobConditionInfo, JobPodStatus, PodInfo, StatusPage, StatusQuery,
    DEFAULT_PAGE_SIZE,
};
