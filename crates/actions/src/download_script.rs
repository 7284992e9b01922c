// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-container download of an action tarball.
//!
//! The job image may ship curl, wget, or only python3, so each is tried
//! in turn. `$XC_GITHUB_TOKEN` is read from the container env at run time.

use crate::download::{tarball_url, GITHUB_API};
use std::fmt::Write as _;
use xci_script::quote::sh_quote;
use xci_workflow::ActionRef;

/// Shell that leaves the action unpacked in `$workdir` under a fresh
/// `$tmpdir`.
pub fn download_script(action: &ActionRef) -> String {
    let url = tarball_url(GITHUB_API, action);
    let mut b = String::new();

    b.push_str("tmpdir=$(mktemp -d)\n");
    b.push_str("workdir=\"$tmpdir/action\"\n");
    b.push_str("mkdir -p \"$workdir\"\n");
    let _ = writeln!(b, "url={}", sh_quote(&url));
    b.push_str("out=\"$tmpdir/action.tgz\"\n");

    b.push_str("if command -v curl >/dev/null 2>&1; then\n");
    b.push_str("  accept='Accept: application/vnd.github+json'\n");
    b.push_str("  if [ -n \"$XC_GITHUB_TOKEN\" ]; then\n");
    b.push_str("    auth=\"Authorization: token $XC_GITHUB_TOKEN\"\n");
    b.push_str("    curl -fsSL -H \"$auth\" -H \"$accept\" \"$url\" -o \"$out\"\n");
    b.push_str("  else\n");
    b.push_str("    curl -fsSL -H \"$accept\" \"$url\" -o \"$out\"\n");
    b.push_str("  fi\n");
    b.push_str("elif command -v wget >/dev/null 2>&1; then\n");
    b.push_str("  if [ -n \"$XC_GITHUB_TOKEN\" ]; then\n");
    b.push_str("    auth=\"Authorization: token $XC_GITHUB_TOKEN\"\n");
    b.push_str("    wget --header=\"$auth\" -qO \"$out\" \"$url\"\n");
    b.push_str("  else\n");
    b.push_str("    wget -qO \"$out\" \"$url\"\n");
    b.push_str("  fi\n");
    b.push_str("else\n");
    b.push_str("  python3 - \"$url\" \"$out\" <<'PY'\n");
    b.push_str("import os, sys, urllib.request\n");
    b.push_str("u, o = sys.argv[1], sys.argv[2]\n");
    b.push_str("req = urllib.request.Request(u)\n");
    b.push_str("tok = os.environ.get('XC_GITHUB_TOKEN', '')\n");
    b.push_str("if tok: req.add_header('Authorization', 'token ' + tok)\n");
    b.push_str("req.add_header('Accept', 'application/vnd.github+json')\n");
    b.push_str("with urllib.request.urlopen(req, timeout=30) as resp:\n");
    b.push_str("    open(o, 'wb').write(resp.read())\n");
    b.push_str("PY\n");
    b.push_str("fi\n");

    b.push_str("if command -v tar >/dev/null 2>&1; then\n");
    b.push_str("  tar -xzf \"$out\" -C \"$workdir\" --strip-components=1\n");
    b.push_str("else\n");
    b.push_str("  echo 'tar not available'; exit 1\n");
    b.push_str("fi\n");
    b
}

#[cfg(test)]
#[path = "download_script_tests.rs"]
mod tests;
