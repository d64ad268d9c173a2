// SPDX-License-Identifier: GPL-3.0-only

//! Volume snapshots shared between the registry, its log output and clients.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{BackupMethod, FilesystemType};

/// Kind of storage a volume lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    /// Raw eMMC flash partition
    Emmc,

    /// Device behind a specialized controller, presented like an image
    Image,

    Other,
}

impl MemoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Emmc => "emmc",
            Self::Image => "img",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSummary {
    pub display_name: String,
    pub label: String,
    pub memory: MemoryKind,
    pub backup_method: BackupMethod,
    pub fs_type: FilesystemType,

    /// Mount point, if the volume has one
    pub mount_point: Option<String>,

    /// Backing block device (empty for folder volumes)
    pub block_device: String,

    pub memory_device: String,
    pub mounted: bool,
    pub mountable: bool,

    /// Size in bytes (0 when unknown)
    pub size: u64,

    /// Used bytes, only filled in when the volume was already mounted
    pub used: Option<u64>,
}
