// SPDX-License-Identifier: GPL-3.0-only

use std::path::Path;

use nix::sys::statvfs::statvfs;

use crate::error::Result;

/// Space figures for a mounted filesystem, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilesystemUsage {
    pub total: u64,
    pub free: u64,
}

impl FilesystemUsage {
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.free)
    }
}

/// statvfs the filesystem holding `mount_point`
pub fn usage_for_mount_point(mount_point: &Path) -> Result<FilesystemUsage> {
    let stat = statvfs(mount_point)?;

    #[allow(clippy::unnecessary_cast)]
    let frsize = if stat.fragment_size() > 0 {
        stat.fragment_size() as u64
    } else {
        stat.block_size() as u64
    };

    #[allow(clippy::unnecessary_cast)]
    Ok(FilesystemUsage {
        total: (stat.blocks() as u64).saturating_mul(frsize),
        free: (stat.blocks_free() as u64).saturating_mul(frsize),
    })
}

/// Bytes in use: (total blocks - free blocks) * block size
pub fn used_bytes(mount_point: &Path) -> Result<u64> {
    usage_for_mount_point(mount_point).map(|usage| usage.used())
}
