// SPDX-License-Identifier: GPL-3.0-only

//! Volumes backed by a block device: raw-flash partitions and devices behind
//! a specialized controller.

use std::path::Path;
use std::rc::Rc;

use storage_sys::{
    EmmcPartition, find_mke2fs, find_partition, format_ext, partition_size, readlink_recursive,
    remove_contents, used_bytes,
};
use storage_types::{BackupMethod, FilesystemType, MemoryKind, SpecialPartition};
use tracing::{debug, info};

use super::{VolumeEnv, check_format_type};
use crate::error::{Result, VolumeError};
use crate::fstab::Fstab;
use crate::oracle::FsTypeOracle;

/// Partition label that is always backed up as an image
const BOOT_LABEL: &str = "boot";

/// Sources consulted while building volumes during one registry rebuild
pub struct Discovery<'a> {
    pub env: Rc<VolumeEnv>,
    pub fstab: &'a Fstab,
    pub oracle: &'a mut FsTypeOracle,

    /// `/proc/emmc` rows, when the kernel provides them
    pub emmc_partitions: Option<&'a [EmmcPartition]>,

    /// `/proc/partitions`, used for sizes when `emmc_partitions` has no row
    pub partitions_info: &'a Path,

    pub special_partitions: &'a [SpecialPartition],
}

/// Mountability and backup method for a device.
///
/// File-based filesystems mount and are copied file by file; everything else,
/// and anything without a mount point, is copied as a raw image. The `boot`
/// partition is always an image.
pub fn classify(fs_type: FilesystemType, has_mount_point: bool, label: &str) -> (bool, BackupMethod) {
    let (mountable, backup_method) = if has_mount_point && fs_type.is_file_based() {
        (true, BackupMethod::Files)
    } else {
        (false, BackupMethod::Image)
    };

    if label == BOOT_LABEL {
        return (mountable, BackupMethod::Image);
    }

    (mountable, backup_method)
}

#[derive(Debug, Clone)]
pub struct BlockVolume {
    display_name: String,
    label: String,
    memory_kind: MemoryKind,
    backup_method: BackupMethod,
    fs_type: FilesystemType,
    mount_point: Option<String>,
    block_device: String,
    memory_device: String,
    mountable: bool,
    size: u64,
    env: Rc<VolumeEnv>,
}

impl BlockVolume {
    /// Build a volume for a raw-flash partition.
    ///
    /// The eMMC listing gives label and size directly; the recovery table
    /// gives the mount point. A device neither knows about is a dead volume.
    pub fn raw_flash(device: &str, discovery: &mut Discovery<'_>) -> Self {
        let block_device = readlink_recursive(device);
        let fstab = discovery.fstab;
        let info = discovery
            .emmc_partitions
            .and_then(|partitions| find_partition(partitions, &block_device));
        let entry = fstab.entry(&block_device);

        if info.is_none() && entry.is_none() {
            debug!(device = %block_device, "No eMMC row or table entry");
            return Self::dead(device, block_device, MemoryKind::Emmc, discovery.env.clone());
        }

        let mut volume = Self::blank(device, block_device, MemoryKind::Emmc, discovery.env.clone());

        if let Some(info) = info {
            volume.display_name = info.label.clone();
            volume.label = info.label.clone();
            volume.size = info.size;
        }

        if let Some(entry) = entry {
            if info.is_none() {
                volume.name_after(entry.mount_point());
                volume.size =
                    partition_size(discovery.partitions_info, &volume.block_device).unwrap_or(0);
            }
            volume.mount_point = Some(entry.mount_point().to_string());
        }

        volume.finish(discovery)
    }

    /// Build a volume for a device behind a specialized controller. Only the
    /// recovery table is consulted.
    pub fn controller(device: &str, discovery: &mut Discovery<'_>) -> Self {
        let block_device = readlink_recursive(device);
        let fstab = discovery.fstab;

        let Some(entry) = fstab.entry(&block_device) else {
            debug!(device = %block_device, "No table entry");
            return Self::dead(device, block_device, MemoryKind::Image, discovery.env.clone());
        };

        let mut volume = Self::blank(device, block_device, MemoryKind::Image, discovery.env.clone());
        volume.name_after(entry.mount_point());
        volume.size = partition_size(discovery.partitions_info, &volume.block_device).unwrap_or(0);
        volume.mount_point = Some(entry.mount_point().to_string());

        volume.finish(discovery)
    }

    fn blank(
        memory_device: &str,
        block_device: String,
        memory_kind: MemoryKind,
        env: Rc<VolumeEnv>,
    ) -> Self {
        Self {
            display_name: String::new(),
            label: String::new(),
            memory_kind,
            backup_method: BackupMethod::Unknown,
            fs_type: FilesystemType::Unknown,
            mount_point: None,
            block_device,
            memory_device: memory_device.to_string(),
            mountable: false,
            size: 0,
            env,
        }
    }

    /// Placeholder for a device nothing describes: queryable, never usable
    fn dead(
        memory_device: &str,
        block_device: String,
        memory_kind: MemoryKind,
        env: Rc<VolumeEnv>,
    ) -> Self {
        let mut volume = Self::blank(memory_device, block_device, memory_kind, env);
        volume.display_name = volume.block_device.clone();
        volume.label = volume.block_device.clone();
        volume.backup_method = BackupMethod::None;
        volume
    }

    /// `/system` -> `system`
    fn name_after(&mut self, mount_point: &str) {
        let name = mount_point.strip_prefix('/').unwrap_or(mount_point);
        self.display_name = name.to_string();
        self.label = name.to_string();
    }

    fn finish(mut self, discovery: &mut Discovery<'_>) -> Self {
        if self.mount_point.is_some() {
            self.fs_type = discovery.oracle.fs_type(&self.block_device);
        }

        let (mountable, backup_method) =
            classify(self.fs_type, self.mount_point.is_some(), &self.label);
        self.mountable = mountable;
        self.backup_method = backup_method;

        if let Some(special) = discovery
            .special_partitions
            .iter()
            .find(|special| special.name == self.label)
        {
            debug!(label = %self.label, "Applying special partition override");
            self.display_name = special.display_name().to_string();
            self.backup_method = special.backup_method;
            self.mountable = special.mountable;
        }

        debug!(
            device = %self.block_device,
            label = %self.label,
            fs_type = %self.fs_type,
            mountable = self.mountable,
            backup = %self.backup_method,
            "Classified volume"
        );
        self
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn memory_kind(&self) -> MemoryKind {
        self.memory_kind
    }

    pub fn backup_method(&self) -> BackupMethod {
        self.backup_method
    }

    pub fn fs_type(&self) -> FilesystemType {
        self.fs_type
    }

    pub fn mount_point(&self) -> Option<&str> {
        self.mount_point.as_deref()
    }

    pub fn block_device(&self) -> &str {
        &self.block_device
    }

    pub fn memory_device(&self) -> &str {
        &self.memory_device
    }

    pub fn is_mountable(&self) -> bool {
        self.mountable
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Neither mountable nor backed up by any known method
    pub fn is_dead(&self) -> bool {
        !self.mountable && !self.backup_method.is_backed_up()
    }

    fn mountable_point(&self) -> Result<&Path> {
        match self.mount_point.as_deref() {
            Some(mount_point) if self.mountable => Ok(Path::new(mount_point)),
            _ => Err(VolumeError::NotMountable(self.display_name.clone())),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mountable_point()
            .is_ok_and(|mount_point| self.env.mounter().is_mounted(mount_point))
    }

    pub fn mount(&self) -> Result<()> {
        let mount_point = self.mountable_point()?;
        if self.env.mounter().is_mounted(mount_point) {
            return Ok(());
        }

        self.env
            .mounter()
            .mount(&self.block_device, mount_point, self.fs_type.as_str())?;
        Ok(())
    }

    pub fn unmount(&self) -> Result<()> {
        let mount_point = self.mountable_point()?;
        if !self.env.mounter().is_mounted(mount_point) {
            return Ok(());
        }

        self.env.mounter().unmount(mount_point)?;
        Ok(())
    }

    pub fn used_bytes(&self) -> Result<u64> {
        self.mount()?;
        let mount_point = self.mountable_point()?;
        Ok(used_bytes(mount_point)?)
    }

    pub fn format(&self, new_type: FilesystemType) -> Result<()> {
        check_format_type(&self.display_name, self.fs_type, new_type)?;

        if self.mount_point.as_deref() == Some(self.env.data_mount_point()) {
            let media_dir = self.env.media_dir();
            if media_dir.is_dir() {
                // Never wipe the directory underneath an unmounted data volume
                self.mount()?;
                let mount_point = self.mountable_point()?;
                info!(
                    volume = %self.display_name,
                    media = %media_dir.display(),
                    "Wiping data volume, keeping media"
                );
                remove_contents(mount_point, Some(media_dir))?;
                return Ok(());
            }
        }

        if self.fs_type.is_ext() {
            if self.is_mounted() {
                self.unmount()?;
            }
            let mke2fs = find_mke2fs(self.env.mke2fs(), self.env.tool_search_path())?;
            format_ext(
                self.env.runner().as_ref(),
                &mke2fs,
                self.fs_type,
                &self.block_device,
            )?;
            return Ok(());
        }

        self.mount()?;
        let mount_point = self.mountable_point()?;
        info!(volume = %self.display_name, "Wiping volume contents");
        remove_contents(mount_point, None)?;
        Ok(())
    }
}
