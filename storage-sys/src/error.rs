// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

/// Failures of the blocking device, mount and tool primitives
#[derive(Error, Debug)]
pub enum SysError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// mount(2), umount(2) or statvfs(2) failed
    #[error("system call failed: {0}")]
    Nix(#[from] nix::Error),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Block device directory or device node is missing
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// `blkid` or `mke2fs` could not be found or spawned
    #[error("Required tool not found: {0}")]
    ToolMissing(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

pub type Result<T> = std::result::Result<T, SysError>;
