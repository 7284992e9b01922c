// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk checkpoints of the store tables.
//!
//! A checkpoint is the whole [`Tables`] value as zstd-compressed JSON. It is
//! written to a `.tmp` sibling, fsynced, and renamed into place, so a crash
//! mid-write leaves the previous checkpoint intact.

use crate::Tables;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

/// zstd level used for checkpoints.
const COMPRESSION_LEVEL: i32 = 3;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0}")]
    Version(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub tables: Tables,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(tables: Tables, created_at: DateTime<Utc>) -> Self {
        Self {
            version: CURRENT_SNAPSHOT_VERSION,
            tables,
            created_at,
        }
    }

    /// Write atomically; returns the compressed size in bytes.
    pub fn save(&self, path: &Path) -> Result<u64, SnapshotError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec(self)?;
        let compressed = zstd::encode_all(json.as_slice(), COMPRESSION_LEVEL)?;

        let tmp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&compressed)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;

        Ok(compressed.len() as u64)
    }

    /// Load a checkpoint if one exists.
    ///
    /// A file that fails to decompress or parse is moved aside to `.bak`
    /// and `Ok(None)` is returned, so the executor starts with empty tables.
    pub fn load(path: &Path) -> Result<Option<Self>, SnapshotError> {
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(path)?;
        let decoded = zstd::stream::read::Decoder::new(file)
            .map_err(SnapshotError::from)
            .and_then(|decoder| {
                serde_json::from_reader::<_, Snapshot>(decoder).map_err(SnapshotError::from)
            });

        match decoded {
            Ok(snapshot) if snapshot.version > CURRENT_SNAPSHOT_VERSION => {
                Err(SnapshotError::Version(snapshot.version))
            }
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                let bak_path = rotate_bak_path(path);
                warn!(
                    error = %e,
                    path = %path.display(),
                    bak = %bak_path.display(),
                    "corrupt snapshot, moving to .bak and starting empty",
                );
                fs::rename(path, &bak_path)?;
                Ok(None)
            }
        }
    }
}

const MAX_BAK_FILES: u32 = 3;

/// Next free backup path: `.bak`, then `.bak.2`, `.bak.3`.
///
/// Existing backups shift up one slot and the oldest is dropped once
/// [`MAX_BAK_FILES`] exist.
pub(crate) fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| match n {
        1 => path.with_extension("bak"),
        n => path.with_extension(format!("bak.{n}")),
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
