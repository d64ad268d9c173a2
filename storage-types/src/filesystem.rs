// SPDX-License-Identifier: GPL-3.0-only

//! Filesystem classification as reported by the block-identification probe.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Filesystem types a recovery volume can carry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilesystemType {
    /// Not probed, not recognized, or "leave as is" when formatting
    #[default]
    Unknown,

    /// FAT filesystem
    Vfat,

    /// ext2 filesystem
    Ext2,

    /// ext3 filesystem
    Ext3,

    /// ext4 filesystem
    Ext4,

    /// Log-structured flash filesystem (YAFFS2)
    Yaffs2,

    /// Raw flash controller partition, no filesystem on top
    Mtd,
}

impl FilesystemType {
    pub const ALL: [FilesystemType; 7] = [
        FilesystemType::Unknown,
        FilesystemType::Vfat,
        FilesystemType::Ext2,
        FilesystemType::Ext3,
        FilesystemType::Ext4,
        FilesystemType::Yaffs2,
        FilesystemType::Mtd,
    ];

    /// Name used in fstab files and handed to mount(2)
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Vfat => "vfat",
            Self::Ext2 => "ext2",
            Self::Ext3 => "ext3",
            Self::Ext4 => "ext4",
            Self::Yaffs2 => "yaffs2",
            Self::Mtd => "mtd",
        }
    }

    /// Parse from a probe or fstab string. Anything unrecognized is `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "vfat" => Self::Vfat,
            "ext2" => Self::Ext2,
            "ext3" => Self::Ext3,
            "ext4" => Self::Ext4,
            "yaffs2" => Self::Yaffs2,
            "mtd" => Self::Mtd,
            _ => Self::Unknown,
        }
    }

    /// Types that hold a file tree and can be mounted and file-copied
    pub fn is_file_based(self) -> bool {
        matches!(
            self,
            Self::Vfat | Self::Ext2 | Self::Ext3 | Self::Ext4 | Self::Yaffs2
        )
    }

    /// Types created by `mke2fs`
    pub fn is_ext(self) -> bool {
        matches!(self, Self::Ext2 | Self::Ext3 | Self::Ext4)
    }
}

impl fmt::Display for FilesystemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
