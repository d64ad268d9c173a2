// SPDX-License-Identifier: GPL-3.0-only

//! Volume variants and their shared capability surface.
//!
//! The set of variants is closed: raw-flash partitions, devices behind a
//! specialized controller, and folder pseudo-volumes carved out of another
//! volume. Every capability dispatches through a `match` on [`Volume`].

mod block;
mod folder;

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use storage_sys::{CommandRunner, Mounter};
use storage_types::{BackupMethod, FilesystemType, MemoryKind, VolumeSummary};

use crate::config::VolumesConfig;
use crate::error::{Result, VolumeError};

pub use block::{BlockVolume, Discovery, classify};
pub use folder::FolderVolume;

/// System access shared by every volume of one registry build
pub struct VolumeEnv {
    runner: Rc<dyn CommandRunner>,
    mounter: Rc<dyn Mounter>,
    mke2fs: PathBuf,
    tool_search_path: Option<String>,
    data_mount_point: String,
    media_dir: String,
}

impl VolumeEnv {
    pub fn new(
        runner: Rc<dyn CommandRunner>,
        mounter: Rc<dyn Mounter>,
        config: &VolumesConfig,
    ) -> Self {
        Self {
            runner,
            mounter,
            mke2fs: config.mke2fs.clone(),
            tool_search_path: config.tool_search_path.clone(),
            data_mount_point: config.data_mount_point.clone(),
            media_dir: config.media_dir.clone(),
        }
    }

    pub fn runner(&self) -> &Rc<dyn CommandRunner> {
        &self.runner
    }

    pub fn mounter(&self) -> &Rc<dyn Mounter> {
        &self.mounter
    }

    pub fn data_mount_point(&self) -> &str {
        &self.data_mount_point
    }

    pub fn media_dir(&self) -> &Path {
        Path::new(&self.media_dir)
    }

    pub fn mke2fs(&self) -> &Path {
        &self.mke2fs
    }

    /// Directories searched for tools missing from their configured path
    pub fn tool_search_path(&self) -> Option<&OsStr> {
        self.tool_search_path.as_deref().map(OsStr::new)
    }
}

impl fmt::Debug for VolumeEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VolumeEnv")
            .field("mke2fs", &self.mke2fs)
            .field("tool_search_path", &self.tool_search_path)
            .field("data_mount_point", &self.data_mount_point)
            .field("media_dir", &self.media_dir)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum Volume {
    /// Partition on raw eMMC flash (`mmcblk*`)
    RawFlash(BlockVolume),

    /// Device behind a specialized storage controller (`cyasblk*`)
    Controller(BlockVolume),

    /// Directory inside another volume, presented as a volume of its own
    Folder(FolderVolume),
}

impl Volume {
    /// Wrap `directory` inside `base` as a folder pseudo-volume called `label`
    pub fn folder(base: Volume, directory: impl Into<String>, label: impl Into<String>) -> Self {
        Volume::Folder(FolderVolume::new(base, directory, label))
    }

    pub fn display_name(&self) -> &str {
        match self {
            Volume::RawFlash(volume) | Volume::Controller(volume) => volume.display_name(),
            Volume::Folder(folder) => folder.label(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Volume::RawFlash(volume) | Volume::Controller(volume) => volume.label(),
            Volume::Folder(folder) => folder.label(),
        }
    }

    pub fn memory_kind(&self) -> MemoryKind {
        match self {
            Volume::RawFlash(volume) | Volume::Controller(volume) => volume.memory_kind(),
            Volume::Folder(folder) => folder.base().memory_kind(),
        }
    }

    pub fn backup_method(&self) -> BackupMethod {
        match self {
            Volume::RawFlash(volume) | Volume::Controller(volume) => volume.backup_method(),
            Volume::Folder(_) => BackupMethod::Files,
        }
    }

    pub fn fs_type(&self) -> FilesystemType {
        match self {
            Volume::RawFlash(volume) | Volume::Controller(volume) => volume.fs_type(),
            Volume::Folder(folder) => folder.base().fs_type(),
        }
    }

    pub fn mount_point(&self) -> Option<&str> {
        match self {
            Volume::RawFlash(volume) | Volume::Controller(volume) => volume.mount_point(),
            Volume::Folder(folder) => Some(folder.directory()),
        }
    }

    /// Canonical backing device; empty for folder volumes
    pub fn block_device(&self) -> &str {
        match self {
            Volume::RawFlash(volume) | Volume::Controller(volume) => volume.block_device(),
            Volume::Folder(_) => "",
        }
    }

    /// Device node the volume was discovered through; empty for folder volumes
    pub fn memory_device(&self) -> &str {
        match self {
            Volume::RawFlash(volume) | Volume::Controller(volume) => volume.memory_device(),
            Volume::Folder(_) => "",
        }
    }

    pub fn is_mountable(&self) -> bool {
        match self {
            Volume::RawFlash(volume) | Volume::Controller(volume) => volume.is_mountable(),
            Volume::Folder(folder) => folder.base().is_mountable(),
        }
    }

    pub fn is_mounted(&self) -> bool {
        match self {
            Volume::RawFlash(volume) | Volume::Controller(volume) => volume.is_mounted(),
            Volume::Folder(folder) => folder.base().is_mounted(),
        }
    }

    pub fn mount(&self) -> Result<()> {
        match self {
            Volume::RawFlash(volume) | Volume::Controller(volume) => volume.mount(),
            Volume::Folder(folder) => folder.base().mount(),
        }
    }

    pub fn unmount(&self) -> Result<()> {
        match self {
            Volume::RawFlash(volume) | Volume::Controller(volume) => volume.unmount(),
            Volume::Folder(folder) => folder.base().unmount(),
        }
    }

    /// Size in bytes, 0 when unknown
    pub fn size(&self) -> u64 {
        match self {
            Volume::RawFlash(volume) | Volume::Controller(volume) => volume.size(),
            Volume::Folder(folder) => folder.base().size(),
        }
    }

    /// Bytes in use, recomputed on every call. Mounts the volume if needed.
    pub fn used_bytes(&self) -> Result<u64> {
        match self {
            Volume::RawFlash(volume) | Volume::Controller(volume) => volume.used_bytes(),
            Volume::Folder(folder) => Err(VolumeError::Unsupported(format!(
                "used bytes of folder volume {}",
                folder.label()
            ))),
        }
    }

    /// Wipe the volume, keeping its filesystem type.
    ///
    /// `new_type` must be [`FilesystemType::Unknown`] (keep whatever is there)
    /// or the current type.
    pub fn format(&self, new_type: FilesystemType) -> Result<()> {
        match self {
            Volume::RawFlash(volume) | Volume::Controller(volume) => volume.format(new_type),
            Volume::Folder(folder) => folder.format(new_type),
        }
    }

    pub fn backup(&self, destination: &Path) -> Result<()> {
        Err(VolumeError::Unsupported(format!(
            "backup of {} to {}",
            self.display_name(),
            destination.display()
        )))
    }

    pub fn restore(&self, source: &Path) -> Result<()> {
        Err(VolumeError::Unsupported(format!(
            "restore of {} from {}",
            self.display_name(),
            source.display()
        )))
    }

    /// Whether `name` is one of this volume's identifiers
    pub fn matches(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }

        self.display_name() == name
            || self.label() == name
            || self.mount_point() == Some(name)
            || self.block_device() == name
            || self.memory_device() == name
    }

    /// Snapshot of the volume. Used bytes are only filled in when the volume
    /// is already mounted; taking a summary never mounts.
    pub fn summary(&self) -> VolumeSummary {
        let mounted = self.is_mounted();
        let used = if mounted {
            self.used_bytes().ok()
        } else {
            None
        };

        VolumeSummary {
            display_name: self.display_name().to_string(),
            label: self.label().to_string(),
            memory: self.memory_kind(),
            backup_method: self.backup_method(),
            fs_type: self.fs_type(),
            mount_point: self.mount_point().map(ToString::to_string),
            block_device: self.block_device().to_string(),
            memory_device: self.memory_device().to_string(),
            mounted,
            mountable: self.is_mountable(),
            size: self.size(),
            used,
        }
    }
}

/// Formatting never converts between filesystem types
fn check_format_type(name: &str, current: FilesystemType, requested: FilesystemType) -> Result<()> {
    if requested == FilesystemType::Unknown || requested == current {
        return Ok(());
    }

    Err(VolumeError::Unsupported(format!(
        "formatting {name} as {requested} (currently {current})"
    )))
}
