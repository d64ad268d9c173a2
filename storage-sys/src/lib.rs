// SPDX-License-Identifier: GPL-3.0-only

//! Low-level system operations for recovery storage volumes
//!
//! This crate provides the blocking primitives the volume layer is built on:
//! - Block device listing and first-sector probing
//! - mount/unmount and mount-point detection
//! - Filesystem usage through statvfs
//! - Recursive content removal
//! - External tool invocation (`blkid`, `mke2fs`)
//! - `/proc/partitions` and `/proc/emmc` parsing
//!
//! Mounting and formatting require elevated privileges.

pub mod command;
pub mod device;
pub mod emmc;
pub mod error;
pub mod format;
pub mod links;
pub mod mount;
pub mod remove;
pub mod usage;

pub use command::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use device::{device_name, is_device_available, list_block_devices, partition_size};
pub use emmc::{EmmcPartition, find_partition, read_emmc_partitions};
pub use error::{Result, SysError};
pub use format::{find_mke2fs, format_ext};
pub use links::readlink_recursive;
pub use mount::{Mounter, SystemMounter, is_mounted, mount, unmount};
pub use remove::remove_contents;
pub use usage::{FilesystemUsage, used_bytes, usage_for_mount_point};
