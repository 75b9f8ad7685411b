// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Staged writes: bytes land in a hidden temp file next to their destination
// and are renamed into place once complete. A dropped stage removes itself.

use std::io::Write;
use std::path::Path;

use tempfile::{NamedTempFile, TempPath};

/// Write `bytes` to a fresh temp file inside `dir`.
pub(crate) fn stage(dir: &Path, bytes: &[u8]) -> std::io::Result<TempPath> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    Ok(file.into_temp_path())
}

/// Directory a staged file for `path` must live in to be renamed onto it.
pub(crate) fn stage_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
