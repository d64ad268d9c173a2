// SPDX-License-Identifier: GPL-3.0-only

use storage_sys::SysError;
use thiserror::Error;

/// Errors reported by volume, table and registry operations
#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("volume not found: {0}")]
    NotFound(String),

    #[error("volume is not mountable: {0}")]
    NotMountable(String),

    #[error("I/O failure: {0}")]
    Io(#[source] SysError),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("external tool missing: {0}")]
    ExternalToolMissing(String),

    /// A table line that was skipped; never fatal to a load
    #[error("skipped line {line}: {reason}")]
    ParseSkip { line: usize, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<SysError> for VolumeError {
    fn from(err: SysError) -> Self {
        match err {
            SysError::ToolMissing(tool) => VolumeError::ExternalToolMissing(tool),
            other => VolumeError::Io(other),
        }
    }
}

impl From<std::io::Error> for VolumeError {
    fn from(err: std::io::Error) -> Self {
        VolumeError::Io(SysError::Io(err))
    }
}

pub type Result<T> = std::result::Result<T, VolumeError>;
