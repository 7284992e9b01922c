// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fetching and unpacking action tarballs on the executor side.

use crate::ActionError;
use async_trait::async_trait;
use flate2::read::GzDecoder;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use xci_workflow::ActionRef;

pub const GITHUB_API: &str = "https://api.github.com";

/// Source of gzip-compressed repository tarballs.
#[async_trait]
pub trait TarballSource: Send + Sync + 'static {
    async fn fetch(&self, action: &ActionRef, token: Option<&str>) -> Result<Vec<u8>, ActionError>;
}

/// Downloads tarballs from the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GithubTarballSource {
    client: reqwest::Client,
    api_base: String,
}

impl GithubTarballSource {
    pub fn new() -> Result<Self, ActionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("xci-executor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ActionError::Download(e.to_string()))?;
        Ok(Self {
            client,
            api_base: GITHUB_API.to_string(),
        })
    }

    /// Point at a GitHub Enterprise or mirror API root.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn tarball_url(&self, action: &ActionRef) -> String {
        tarball_url(&self.api_base, action)
    }
}

pub(crate) fn tarball_url(api_base: &str, action: &ActionRef) -> String {
    format!(
        "{}/repos/{}/{}/tarball/{}",
        api_base, action.owner, action.name, action.version
    )
}

#[async_trait]
impl TarballSource for GithubTarballSource {
    async fn fetch(&self, action: &ActionRef, token: Option<&str>) -> Result<Vec<u8>, ActionError> {
        let url = self.tarball_url(action);
        let mut request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = token {
            request = request.header(reqwest::header::AUTHORIZATION, format!("token {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ActionError::Download(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ActionError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ActionError::Download(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Unpack a gzip tarball into `dest`, dropping the single top-level
/// directory that repository archives wrap their contents in.
///
/// Only regular files and directories are written. Entries that would
/// escape `dest` are rejected.
pub fn extract_tarball(bytes: &[u8], dest: &Path) -> Result<(), ActionError> {
    let extract_err = |e: std::io::Error| ActionError::Extract(e.to_string());
    std::fs::create_dir_all(dest)?;

    let mut archive = tar::Archive::new(GzDecoder::new(bytes));
    let mut top: Option<OsString> = None;

    for entry in archive.entries().map_err(extract_err)? {
        let mut entry = entry.map_err(extract_err)?;
        let kind = entry.header().entry_type();
        if !(kind.is_file() || kind.is_dir()) {
            continue;
        }

        let path = entry.path().map_err(extract_err)?.into_owned();
        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_os_string()),
                Component::CurDir => {}
                _ => {
                    return Err(ActionError::Extract(format!(
                        "unsafe entry path: {}",
                        path.display()
                    )))
                }
            }
        }
        let Some(first) = parts.first().cloned() else {
            continue;
        };

        let prefix = top.get_or_insert_with(|| first.clone());
        let relative: PathBuf = if *prefix == first {
            parts.iter().skip(1).collect()
        } else {
            parts.iter().collect()
        };
        if relative.as_os_str().is_empty() {
            continue;
        }

        let out = dest.join(&relative);
        if kind.is_dir() {
            std::fs::create_dir_all(&out)?;
        } else {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            entry.unpack(&out).map_err(extract_err)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "download_tests.rs"]
mod tests;
