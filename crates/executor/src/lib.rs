// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! xci executor library
//!
//! The executor process owns the build store, consumes queued builds and
//! serves the local control socket. The binary in `main.rs` wires these
//! pieces together; the protocol types are public for clients.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod consumer;
pub mod env;
pub mod lifecycle;
pub mod listener;
pub mod protocol;

#[cfg(test)]
mod test_helpers;

pub use consumer::{parse_build_message, BuildQueue, Consumer, QueueError};
pub use lifecycle::{Config, ExecutorState, LifecycleError, Recovery, StartupResult};
pub use listener::{Listener, ListenerCtx};
pub use protocol::{
    BuildDetail, BuildPage, ProtocolError, Request, Response, DEFAULT_LOG_LIMIT, DEFAULT_TIMEOUT,
    MAX_MESSAGE_SIZE, PROTOCOL_VERSION,
};
