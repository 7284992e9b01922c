// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control protocol for the executor socket.
//!
//! Wire format: one JSON object per line, one request and one response per
//! connection.

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use xci_core::{Build, BuildId, BuildJob, BuildStep};
use xci_engine::{CancelOutcome, StatusPage};

/// Log chunks returned when a `Logs` request names no limit.
pub const DEFAULT_LOG_LIMIT: usize = 100;

/// Builds per page when a `ListBuilds` request names no page size.
pub const DEFAULT_BUILD_PAGE_SIZE: usize = 20;

fn default_log_limit() -> usize {
    DEFAULT_LOG_LIMIT
}

/// Request from a client to the executor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Create a build from workflow text and queue it
    Submit {
        pipeline_id: u64,
        name: String,
        workflow: String,
        #[serde(default)]
        triggered_by: String,
        #[serde(default)]
        commit_sha: String,
        #[serde(default)]
        branch: String,
        #[serde(default)]
        variables: BTreeMap<String, String>,
    },

    /// Queue an existing build from a raw `"<build_id>|…"` message body
    Enqueue { message: String },

    /// Live cluster view of a build
    Status {
        build_id: BuildId,
        #[serde(default)]
        job_name_prefix: Option<String>,
        #[serde(default)]
        page: Option<usize>,
        #[serde(default)]
        page_size: Option<usize>,
    },

    /// Build row, workflow text, jobs and steps
    GetBuild { build_id: BuildId },

    /// Builds of one pipeline, newest first
    ListBuilds {
        pipeline_id: u64,
        #[serde(default)]
        page: Option<usize>,
        #[serde(default)]
        page_size: Option<usize>,
    },

    /// Stored output of a build
    Logs {
        build_id: BuildId,
        #[serde(default)]
        offset: usize,
        #[serde(default = "default_log_limit")]
        limit: usize,
        /// Insert a heading line whenever the step changes
        #[serde(default)]
        annotate: bool,
    },

    Cancel { build_id: BuildId },

    /// Request executor shutdown
    Shutdown,
}

/// One build with everything stored for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildDetail {
    pub build: Build,
    pub workflow: Option<String>,
    pub jobs: Vec<BuildJob>,
    pub steps: Vec<BuildStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildPage {
    pub builds: Vec<Build>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Response from the executor to a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    Pong { version: String },

    /// Build created and queued
    Submitted { build_id: BuildId },

    /// Build queued
    Queued { build_id: BuildId },

    Status { status: StatusPage },

    Build { detail: Box<BuildDetail> },

    Builds { page: BuildPage },

    /// `next_offset` counts stored chunks, never heading lines
    Logs {
        lines: Vec<String>,
        next_offset: usize,
    },

    Cancelled { outcome: CancelOutcome },

    ShuttingDown,

    /// Error response
    Error { message: String },
}

impl Response {
    pub fn error(message: impl std::fmt::Display) -> Self {
        Response::Error {
            message: message.to_string(),
        }
    }
}

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout")]
    Timeout,
}

/// Maximum message size (16 MB)
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Default IPC timeout
pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Protocol version (from Cargo.toml)
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Encode a message to JSON bytes (without the trailing newline)
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, ProtocolError> {
    let json = serde_json::to_vec(msg)?;

    if json.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: json.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    Ok(json)
}

/// Decode a message from wire format
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read one newline-terminated message.
///
/// A final line without a newline is accepted at end of stream.
pub async fn read_message<R: AsyncBufRead + Unpin>(
    reader: &mut R,
) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = Vec::new();
    let read = (&mut *reader)
        .take(MAX_MESSAGE_SIZE as u64 + 1)
        .read_until(b'\n', &mut buf)
        .await?;
    if read == 0 {
        return Err(ProtocolError::ConnectionClosed);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: buf.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(buf)
}

/// Write one message followed by a newline
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: data.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    writer.write_all(data).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

/// Read a request with timeout
pub async fn read_request<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    timeout: std::time::Duration,
) -> Result<Request, ProtocolError> {
    let bytes = tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&bytes)
}

/// Write a response with timeout
pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: std::time::Duration,
) -> Result<(), ProtocolError> {
    let data = encode(response)?;
    tokio::time::timeout(timeout, write_message(writer, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

/// Send one request and wait for its response.
pub async fn call<S>(
    stream: &mut S,
    request: &Request,
    timeout: std::time::Duration,
) -> Result<Response, ProtocolError>
where
    S: tokio::io::AsyncRead + AsyncWrite + Unpin,
{
    let data = encode(request)?;
    tokio::time::timeout(timeout, write_message(stream, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    let mut reader = tokio::io::BufReader::new(stream);
    let bytes = tokio::time::timeout(timeout, read_message(&mut reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&bytes)
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
