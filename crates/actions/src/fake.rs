// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory tarball source for tests.

use crate::{ActionError, TarballSource};
use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use xci_workflow::ActionRef;

/// Recorded fetch call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeFetch {
    pub action: String,
    pub token: Option<String>,
}

#[derive(Default)]
struct FakeState {
    tarballs: HashMap<String, Vec<u8>>,
    calls: Vec<FakeFetch>,
}

/// Serves tarballs keyed by `owner/name@version`. Unknown keys answer 404.
#[derive(Clone, Default)]
pub struct FakeTarballSource {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeTarballSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tarball(self, key: &str, bytes: Vec<u8>) -> Self {
        self.inner.lock().tarballs.insert(key.to_string(), bytes);
        self
    }

    pub fn calls(&self) -> Vec<FakeFetch> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl TarballSource for FakeTarballSource {
    async fn fetch(&self, action: &ActionRef, token: Option<&str>) -> Result<Vec<u8>, ActionError> {
        let key = format!("{}@{}", action.repo(), action.version);
        let mut inner = self.inner.lock();
        inner.calls.push(FakeFetch {
            action: key.clone(),
            token: token.map(String::from),
        });
        inner
            .tarballs
            .get(&key)
            .cloned()
            .ok_or_else(|| ActionError::HttpStatus {
                status: 404,
                url: key,
            })
    }
}

/// Build a gzip tarball whose entries all live under `top/`, the way
/// repository archives are laid out.
pub fn build_tarball(top: &str, files: &[(&str, &str)]) -> std::io::Result<Vec<u8>> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));

    let mut dir = tar::Header::new_gnu();
    dir.set_entry_type(tar::EntryType::Directory);
    dir.set_mode(0o755);
    dir.set_size(0);
    builder.append_data(&mut dir, format!("{}/", top), std::io::empty())?;

    for (path, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_mode(0o644);
        header.set_size(contents.len() as u64);
        let name = format!("{top}/{path}");
        builder.append_data(&mut header, name, contents.as_bytes())?;
    }

    builder.into_inner()?.finish()
}
