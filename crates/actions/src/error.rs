// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;
use xci_workflow::UsesError;

/// Errors from resolving a `uses:` step
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Uses(#[from] UsesError),

    #[error("download action tarball: {0}")]
    Download(String),

    #[error("download action tarball: HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("extract action tarball: {0}")]
    Extract(String),

    #[error("subpath not found: {0}")]
    SubpathNotFound(String),

    #[error("action metadata not found (no action.yml or action.yaml)")]
    MetadataNotFound,

    #[error("action search stopped after {0} entries")]
    WalkLimit(usize),

    #[error("load action metadata: {0}")]
    Metadata(String),

    #[error("local action {name}: {message}")]
    Local { name: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
