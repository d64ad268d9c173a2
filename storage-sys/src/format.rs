// SPDX-License-Identifier: GPL-3.0-only

//! ext2/3/4 formatting through `mke2fs`.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use storage_types::FilesystemType;
use tracing::{info, warn};

use crate::command::{CommandRunner, render};
use crate::error::{Result, SysError};

/// Program name searched for when the configured location is absent
pub const MKE2FS: &str = "mke2fs";

/// Locate the formatter: the configured path if it exists, else `mke2fs` in
/// `search_path` (`PATH`-style list), or in `PATH` itself when that is `None`
pub fn find_mke2fs(configured: &Path, search_path: Option<&OsStr>) -> Result<PathBuf> {
    if configured.exists() {
        return Ok(configured.to_path_buf());
    }

    let found = match search_path {
        Some(paths) => which::which_in(MKE2FS, Some(paths), "."),
        None => which::which(MKE2FS),
    };
    found.map_err(|_| SysError::ToolMissing(MKE2FS.to_string()))
}

/// Arguments for creating `fs_type` on `device` with no reserved blocks
pub fn mke2fs_args(fs_type: FilesystemType, device: &str) -> Vec<String> {
    vec![
        "-t".to_string(),
        fs_type.as_str().to_string(),
        "-m".to_string(),
        "0".to_string(),
        device.to_string(),
    ]
}

/// Create a fresh ext filesystem on `device`
pub fn format_ext(
    runner: &dyn CommandRunner,
    mke2fs: &Path,
    fs_type: FilesystemType,
    device: &str,
) -> Result<()> {
    if !fs_type.is_ext() {
        return Err(SysError::OperationFailed(format!(
            "{fs_type} is not created by mke2fs"
        )));
    }

    let args = mke2fs_args(fs_type, device);
    info!(command = %render(mke2fs, &args), "Formatting device");

    let output = runner.run(mke2fs, &args)?;
    if !output.success() {
        warn!(device, status = ?output.status, "mke2fs failed: {}", output.stderr.trim());
        return Err(SysError::OperationFailed(format!(
            "mke2fs exited with {:?} for {device}: {}",
            output.status,
            output.stderr.trim()
        )));
    }

    Ok(())
}
