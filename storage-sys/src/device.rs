// SPDX-License-Identifier: GPL-3.0-only

//! Block device discovery and probing.

use std::fs::{self, File};
use std::io::Read;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, SysError};

/// Size of the sector read when checking that a device is usable
pub const PROBE_SECTOR_SIZE: usize = 512;

/// Full paths of the block device nodes directly inside `dir`, sorted by name.
///
/// Fails only when the directory itself cannot be read.
pub fn list_block_devices(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SysError::DeviceNotFound(dir.display().to_string())
        } else {
            SysError::Io(e)
        }
    })?;

    let mut devices = Vec::new();
    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_block_device() {
            continue;
        }
        devices.push(entry.path().to_string_lossy().into_owned());
    }

    devices.sort();
    debug!(dir = %dir.display(), count = devices.len(), "Listed block devices");
    Ok(devices)
}

/// Whether `device` can be opened and its first sector read in full
pub fn is_device_available(device: &str) -> bool {
    let Ok(mut file) = File::open(device) else {
        return false;
    };

    let mut sector = [0u8; PROBE_SECTOR_SIZE];
    file.read_exact(&mut sector).is_ok()
}

/// Final path component of a device path (`/dev/block/mmcblk0p1` -> `mmcblk0p1`)
pub fn device_name(device: &str) -> &str {
    device.rsplit('/').next().unwrap_or(device)
}

/// Look up the size in bytes of `device` in `/proc/partitions` text.
///
/// Rows are `major minor #blocks name` with 1 KiB blocks; the header row and
/// blank lines are ignored. The device is matched by its file name.
pub fn partition_size_from(partitions: &str, device: &str) -> Option<u64> {
    let name = device_name(device);

    partitions.lines().find_map(|line| {
        let mut fields = line.split_whitespace();
        let _major: u64 = fields.next()?.parse().ok()?;
        let _minor: u64 = fields.next()?.parse().ok()?;
        let blocks: u64 = fields.next()?.parse().ok()?;
        let dev = fields.next()?;

        (dev == name).then(|| blocks.saturating_mul(1024))
    })
}

/// Size in bytes of `device` according to the partitions file at `path`
pub fn partition_size(path: &Path, device: &str) -> Option<u64> {
    let partitions = fs::read_to_string(path).ok()?;
    partition_size_from(&partitions, device)
}
