// SPDX-License-Identifier: GPL-3.0-only

//! `/proc/emmc` partition listing exported by some eMMC kernels.
//!
//! ```text
//! dev:        size     erasesize name
//! mmcblk0p17: 00040000 00000200 "misc"
//! mmcblk0p21: 0087f400 00000200 "recovery"
//! ```

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::device::device_name;

/// One partition row: device name, size in bytes and partition label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmmcPartition {
    pub device: String,
    pub size: u64,
    pub label: String,
}

fn parse_row(line: &str) -> Option<EmmcPartition> {
    let mut fields = line.split_whitespace();
    let device = fields.next()?.strip_suffix(':')?;
    if device.is_empty() || device == "dev" {
        return None;
    }

    let size = u64::from_str_radix(fields.next()?, 16).ok()?;
    let _erase_size = fields.next()?;

    let label = fields.collect::<Vec<_>>().join(" ");
    let label = label.trim_matches('"');
    if label.is_empty() {
        return None;
    }

    Some(EmmcPartition {
        device: device.to_string(),
        size,
        label: label.to_string(),
    })
}

/// Parse `/proc/emmc` text, skipping the header and malformed rows
pub fn parse_emmc_partitions(input: &str) -> Vec<EmmcPartition> {
    input.lines().filter_map(parse_row).collect()
}

/// Read and parse the listing at `path`. A missing file yields `None`.
pub fn read_emmc_partitions(path: &Path) -> Option<Vec<EmmcPartition>> {
    let input = fs::read_to_string(path).ok()?;
    let partitions = parse_emmc_partitions(&input);
    debug!(path = %path.display(), count = partitions.len(), "Read eMMC partition listing");
    Some(partitions)
}

/// Row for `device`, matched on the device's file name
pub fn find_partition<'a>(partitions: &'a [EmmcPartition], device: &str) -> Option<&'a EmmcPartition> {
    let name = device_name(device);
    partitions.iter().find(|partition| partition.device == name)
}
