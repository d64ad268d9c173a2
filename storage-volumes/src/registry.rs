// SPDX-License-Identifier: GPL-3.0-only

//! The live set of volumes and the tables and caches used to build it.

use std::fs;
use std::path::Path;
use std::rc::Rc;

use storage_sys::{
    CommandRunner, Mounter, SystemCommandRunner, SystemMounter, device_name, list_block_devices,
    read_emmc_partitions, readlink_recursive,
};
use storage_types::{FilesystemType, VolumeSummary};
use tracing::{debug, info, warn};

use crate::config::{OracleRefresh, VolumesConfig};
use crate::error::{Result, VolumeError};
use crate::fstab::{Fstab, FstabLayout};
use crate::oracle::FsTypeOracle;
use crate::table::render_table;
use crate::volume::{BlockVolume, Discovery, Volume, VolumeEnv};

/// How a block device node is handled, decided by its name prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// Raw flash behind an MTD controller; recognized but not handled
    Unsupported,
    RawFlash,
    Controller,
    Ignored,
}

impl DeviceClass {
    pub fn of(name: &str, config: &VolumesConfig) -> Self {
        let has_prefix =
            |prefixes: &[String]| prefixes.iter().any(|prefix| name.starts_with(prefix.as_str()));

        if has_prefix(&config.unsupported_prefixes) {
            DeviceClass::Unsupported
        } else if has_prefix(&config.raw_flash_prefixes) {
            DeviceClass::RawFlash
        } else if has_prefix(&config.controller_prefixes) {
            DeviceClass::Controller
        } else {
            DeviceClass::Ignored
        }
    }
}

/// Owns every volume of the running system.
///
/// Rebuilds are wholesale: the previous set is dropped before the new one is
/// built. Lookups on an empty registry rebuild it first.
pub struct VolumeRegistry {
    config: VolumesConfig,
    env: Rc<VolumeEnv>,
    oracle: FsTypeOracle,
    recovery_fstab: Option<Fstab>,
    volumes: Vec<Volume>,
}

impl VolumeRegistry {
    /// Registry that runs real tools and mounts for real
    pub fn new(config: VolumesConfig) -> Self {
        Self::with_system(
            config,
            Rc::new(SystemCommandRunner),
            Rc::new(SystemMounter),
        )
    }

    pub fn with_system(
        config: VolumesConfig,
        runner: Rc<dyn CommandRunner>,
        mounter: Rc<dyn Mounter>,
    ) -> Self {
        let oracle = FsTypeOracle::new(runner.clone(), config.blkid.clone());
        let env = Rc::new(VolumeEnv::new(runner, mounter, &config));

        Self {
            config,
            env,
            oracle,
            recovery_fstab: None,
            volumes: Vec::new(),
        }
    }

    pub fn config(&self) -> &VolumesConfig {
        &self.config
    }

    /// Scan the block device directory and rebuild every volume.
    ///
    /// Fails only when the directory cannot be read, leaving the registry
    /// empty. Returns the number of volumes held.
    #[doc(alias = "reload")]
    #[doc(alias = "rebuild")]
    pub fn load_volumes(&mut self) -> Result<usize> {
        self.volumes.clear();

        let devices = list_block_devices(&self.config.block_dir).map_err(|e| {
            warn!(dir = %self.config.block_dir.display(), "Cannot scan block devices: {e}");
            VolumeError::from(e)
        })?;

        Ok(self.load_volumes_from(&devices))
    }

    /// Rebuild every volume from an explicit list of device nodes
    pub fn load_volumes_from<S: AsRef<str>>(&mut self, devices: &[S]) -> usize {
        if self.config.oracle_refresh == OracleRefresh::OnRebuild {
            self.oracle.refresh();
        }
        self.volumes.clear();

        let emmc_partitions = read_emmc_partitions(&self.config.emmc_info);
        // Re-read every rebuild so primary/fallback availability is re-checked
        let fstab = self.recovery_fstab.insert(Fstab::load_with_layout(
            &self.config.recovery_fstab,
            FstabLayout::Recovery,
        ));

        let mut discovery = Discovery {
            env: self.env.clone(),
            fstab,
            oracle: &mut self.oracle,
            emmc_partitions: emmc_partitions.as_deref(),
            partitions_info: &self.config.partitions_info,
            special_partitions: &self.config.special_partitions,
        };

        let mut volumes = Vec::new();
        for device in devices {
            let device = device.as_ref();

            match DeviceClass::of(device_name(device), &self.config) {
                DeviceClass::Unsupported => {
                    debug!(device, "MTD devices are not implemented, skipping");
                }
                DeviceClass::RawFlash => {
                    let volume = BlockVolume::raw_flash(device, &mut discovery);
                    if volume.is_dead() {
                        debug!(device, "Pruning dead raw-flash volume");
                        continue;
                    }
                    volumes.push(Volume::RawFlash(volume));
                }
                DeviceClass::Controller => {
                    volumes.push(Volume::Controller(BlockVolume::controller(
                        device,
                        &mut discovery,
                    )));
                }
                DeviceClass::Ignored => {
                    debug!(device, "Ignoring device");
                }
            }
        }

        self.volumes = volumes;
        self.add_media_volume();

        info!(count = self.volumes.len(), "Volumes loaded");
        info!("\n{}", render_table(&self.summaries()));

        self.create_mount_points();
        let runtime = self.runtime_fstab();
        if let Err(e) = runtime.write(&self.config.runtime_fstab) {
            warn!(path = %self.config.runtime_fstab.display(), "Cannot write runtime fstab: {e}");
        }

        self.volumes.len()
    }

    /// Present the media directory embedded in the data partition as a volume
    /// of its own, unless one already answers to the media label.
    fn add_media_volume(&mut self) {
        if self
            .volumes
            .iter()
            .any(|volume| volume.matches(&self.config.media_label))
        {
            return;
        }

        let Some(data) = self
            .volumes
            .iter()
            .find(|volume| volume.matches(&self.config.data_mount_point))
        else {
            return;
        };

        if let Err(e) = data.mount() {
            warn!(volume = %data.display_name(), "Cannot mount data volume: {e}");
        }

        if !Path::new(&self.config.media_dir).is_dir() {
            return;
        }

        info!(directory = %self.config.media_dir, label = %self.config.media_label, "Adding media volume");
        let media = Volume::folder(
            data.clone(),
            self.config.media_dir.clone(),
            self.config.media_label.clone(),
        );
        self.volumes.push(media);
    }

    fn create_mount_points(&self) {
        for volume in &self.volumes {
            if !volume.is_mountable() {
                continue;
            }
            let Some(mount_point) = volume.mount_point() else {
                continue;
            };

            if let Err(e) = fs::create_dir_all(mount_point) {
                warn!(mount_point, "Cannot create mount point: {e}");
            }
        }
    }

    /// Recovery table with each volume's live type and mountability applied
    pub fn runtime_fstab(&mut self) -> Fstab {
        let mut runtime = self.recovery_fstab().clone();

        for volume in &self.volumes {
            let Some(mount_point) = volume.mount_point() else {
                continue;
            };
            if let Some(entry) = runtime.entry_mut(mount_point) {
                entry.set_fs_type(volume.fs_type().as_str());
                entry.set_mountable(volume.is_mountable());
            }
        }

        runtime
    }

    /// Recovery table as read by the last rebuild, or loaded now if none ran
    pub fn recovery_fstab(&mut self) -> &Fstab {
        self.recovery_fstab.get_or_insert_with(|| {
            Fstab::load_with_layout(&self.config.recovery_fstab, FstabLayout::Recovery)
        })
    }

    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    /// First volume answering to `name` once symbolic links are resolved
    pub fn find_volume(&mut self, name: &str) -> Option<&Volume> {
        let name = readlink_recursive(name);

        if self.volumes.is_empty() {
            if let Err(e) = self.load_volumes() {
                warn!("Cannot rebuild volumes for lookup: {e}");
            }
        }

        self.volumes.iter().find(|volume| volume.matches(&name))
    }

    pub fn format_volume(&mut self, name: &str, new_type: FilesystemType) -> Result<()> {
        let volume = self
            .find_volume(name)
            .ok_or_else(|| VolumeError::NotFound(name.to_string()))?;
        volume.format(new_type)
    }

    /// Filesystem type of `device` as seen by the probe cache
    pub fn probe(&mut self, device: &str) -> FilesystemType {
        self.oracle.fs_type(&readlink_recursive(device))
    }

    /// Run the filesystem probe again
    pub fn refresh_oracle(&mut self) {
        self.oracle.refresh();
    }

    pub fn summaries(&self) -> Vec<VolumeSummary> {
        self.volumes.iter().map(Volume::summary).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn devices_are_classed_by_prefix() {
        let config = VolumesConfig::default();

        assert_eq!(DeviceClass::of("mmcblk0p25", &config), DeviceClass::RawFlash);
        assert_eq!(DeviceClass::of("cyasblkdevblk0p3", &config), DeviceClass::Controller);
        assert_eq!(DeviceClass::of("mtdblock3", &config), DeviceClass::Unsupported);
        assert_eq!(DeviceClass::of("loop0", &config), DeviceClass::Ignored);
    }

    #[test]
    fn unreadable_block_dir_leaves_registry_empty() {
        let config = VolumesConfig {
            block_dir: "/nonexistent/dev/block".into(),
            ..VolumesConfig::default()
        };
        let mut registry = VolumeRegistry::with_system(
            config,
            crate::testing::FakeRunner::new(""),
            Rc::new(crate::testing::FakeMounter::default()),
        );

        assert!(registry.load_volumes().is_err());
        assert!(registry.volumes().is_empty());
    }
}
