// SPDX-License-Identifier: GPL-3.0-only

//! Volume discovery and management for the recovery environment
//!
//! A [`VolumeRegistry`] scans the block device directory, reconciles what it
//! finds against the build's recovery table and the `blkid` probe, and holds
//! one [`Volume`] per usable device. Volumes expose mount, unmount, format and
//! usage queries; the registry regenerates the runtime `fstab` on each rebuild.
//!
//! ```no_run
//! use storage_volumes::{VolumeRegistry, VolumesConfig};
//!
//! let mut registry = VolumeRegistry::new(VolumesConfig::default());
//! registry.load_volumes()?;
//! if let Some(data) = registry.find_volume("/data") {
//!     data.mount()?;
//!     println!("{} bytes used", data.used_bytes()?);
//! }
//! # Ok::<(), storage_volumes::VolumeError>(())
//! ```

pub mod config;
pub mod error;
pub mod fstab;
pub mod oracle;
pub mod registry;
pub mod table;
pub mod volume;

#[cfg(test)]
mod testing;

pub use config::{OracleRefresh, VolumesConfig};
pub use error::{Result, VolumeError};
pub use fstab::{Fstab, FstabEntry, FstabLayout};
pub use oracle::FsTypeOracle;
pub use registry::{DeviceClass, VolumeRegistry};
pub use table::render_table;
pub use volume::{BlockVolume, Discovery, FolderVolume, Volume, VolumeEnv, classify};
