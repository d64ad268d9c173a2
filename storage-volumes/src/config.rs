// SPDX-License-Identifier: GPL-3.0-only

//! Build-specific settings for volume discovery.
//!
//! Every field has a default matching a stock recovery image, so an empty
//! file (or none at all, via [`VolumesConfig::default`]) is a valid setup.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use storage_types::{MAX_SPECIAL_PARTITIONS, SpecialPartition};

use crate::error::{Result, VolumeError};

/// When the filesystem-type oracle re-runs its probe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OracleRefresh {
    /// Probe again at the start of every registry rebuild
    #[default]
    OnRebuild,

    /// Probe once, then only when the caller asks for it
    Explicit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumesConfig {
    /// Directory scanned for block device nodes
    pub block_dir: PathBuf,

    /// Recovery table: `mount-point fs-type device [fallback-device]`
    pub recovery_fstab: PathBuf,

    /// Generated runtime table, rewritten on every rebuild
    pub runtime_fstab: PathBuf,

    /// eMMC partition listing used to label raw-flash devices
    pub emmc_info: PathBuf,

    /// Kernel partition listing used for sizes
    pub partitions_info: PathBuf,

    /// Mount point of the primary data partition
    pub data_mount_point: String,

    /// Media directory embedded in the data partition
    pub media_dir: String,

    /// Label given to the folder volume wrapping `media_dir`
    pub media_label: String,

    /// Block identification tool
    pub blkid: PathBuf,

    /// ext formatter; `mke2fs` is looked up in `tool_search_path` when this
    /// does not exist
    pub mke2fs: PathBuf,

    /// `PATH`-style directory list searched for `mke2fs`; unset means `PATH`
    pub tool_search_path: Option<String>,

    pub oracle_refresh: OracleRefresh,

    /// Device name prefixes built as raw-flash volumes
    pub raw_flash_prefixes: Vec<String>,

    /// Device name prefixes built as generic controller volumes
    pub controller_prefixes: Vec<String>,

    /// Device name prefixes recognized but not supported
    pub unsupported_prefixes: Vec<String>,

    pub special_partitions: Vec<SpecialPartition>,
}

impl Default for VolumesConfig {
    fn default() -> Self {
        Self {
            block_dir: PathBuf::from("/dev/block"),
            recovery_fstab: PathBuf::from("/etc/recovery.fstab"),
            runtime_fstab: PathBuf::from("/etc/fstab"),
            emmc_info: PathBuf::from("/proc/emmc"),
            partitions_info: PathBuf::from("/proc/partitions"),
            data_mount_point: "/data".to_string(),
            media_dir: "/data/media".to_string(),
            media_label: "emmc".to_string(),
            blkid: PathBuf::from("blkid"),
            mke2fs: PathBuf::from("/sbin/mke2fs"),
            tool_search_path: None,
            oracle_refresh: OracleRefresh::default(),
            raw_flash_prefixes: vec!["mmcblk".to_string()],
            controller_prefixes: vec!["cyasblk".to_string()],
            unsupported_prefixes: vec!["mtd".to_string()],
            special_partitions: SpecialPartition::from_build_env(),
        }
    }
}

impl VolumesConfig {
    /// Read, parse and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|error| VolumeError::Config(format!("{}: {error}", path.display())))?;

        Self::from_toml(&raw).map_err(|error| match error {
            VolumeError::Config(reason) => {
                VolumeError::Config(format!("{}: {reason}", path.display()))
            }
            other => other,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: VolumesConfig =
            toml::from_str(raw).map_err(|error| VolumeError::Config(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_dir.as_os_str().is_empty() {
            return Err(VolumeError::Config(
                "block_dir must not be empty".to_string(),
            ));
        }

        if self.special_partitions.len() > MAX_SPECIAL_PARTITIONS {
            return Err(VolumeError::Config(format!(
                "at most {MAX_SPECIAL_PARTITIONS} special partitions are supported, got {}",
                self.special_partitions.len()
            )));
        }

        if self
            .special_partitions
            .iter()
            .any(|partition| partition.name.trim().is_empty())
        {
            return Err(VolumeError::Config(
                "special partition names must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
