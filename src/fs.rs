// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

use crate::error::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Read a whole file, mapping any failure to [`Error::NotFound`].
pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::NotFound {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Atomically replace `path` with `contents`, applying `mode` before the rename.
///
/// The data goes to a randomly named temp file next to the target, is synced,
/// and is then renamed over the target. A crash mid-write can leave the temp
/// file behind but never a truncated target.
pub fn replace_file(path: &Path, mode: u32, contents: &[u8]) -> Result<()> {
    // Same directory so the rename stays on one filesystem
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let temp_path = parent.join(format!(".tmp-{:x}", rand::random::<u64>()));

    let result = write_temp(&temp_path, mode, contents).and_then(|()| {
        fs::rename(&temp_path, path).map_err(|e| Error::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    });

    if result.is_err() && temp_path.exists() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_temp(temp_path: &Path, mode: u32, contents: &[u8]) -> Result<()> {
    let write_err = |e| Error::WriteFile {
        path: temp_path.to_path_buf(),
        source: e,
    };

    let mut file = create_with_mode(temp_path, mode).map_err(write_err)?;
    file.write_all(contents).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    drop(file);

    // umask may have stripped bits at create time
    set_mode(temp_path, mode).map_err(write_err)
}

#[cfg(unix)]
fn create_with_mode(path: &Path, mode: u32) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(mode)
        .open(path)
}

#[cfg(not(unix))]
fn create_with_mode(path: &Path, _mode: u32) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}
