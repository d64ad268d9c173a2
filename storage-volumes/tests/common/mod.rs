// SPDX-License-Identifier: GPL-3.0-only

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use storage_sys::{CommandOutput, CommandRunner, Mounter};
use storage_volumes::{VolumeRegistry, VolumesConfig};
use tempfile::TempDir;

/// Canned `blkid` output; every other program is recorded and succeeds
#[derive(Default)]
pub struct FakeRunner {
    pub blkid: RefCell<String>,
    pub probes: Cell<usize>,
    pub calls: RefCell<Vec<(PathBuf, Vec<String>)>>,
}

impl CommandRunner for FakeRunner {
    fn run(&self, program: &Path, args: &[String]) -> storage_sys::Result<CommandOutput> {
        if program.file_name().is_some_and(|name| name == "blkid") {
            self.probes.set(self.probes.get() + 1);
            return Ok(CommandOutput {
                status: Some(0),
                stdout: self.blkid.borrow().clone(),
                stderr: String::new(),
            });
        }

        self.calls
            .borrow_mut()
            .push((program.to_path_buf(), args.to_vec()));
        Ok(CommandOutput {
            status: Some(0),
            ..CommandOutput::default()
        })
    }
}

#[derive(Default)]
pub struct FakeMounter {
    pub mounted: RefCell<HashSet<PathBuf>>,
}

impl Mounter for FakeMounter {
    fn is_mounted(&self, mount_point: &Path) -> bool {
        self.mounted.borrow().contains(mount_point)
    }

    fn mount(&self, _device: &str, mount_point: &Path, _fs_type: &str) -> storage_sys::Result<()> {
        self.mounted.borrow_mut().insert(mount_point.to_path_buf());
        Ok(())
    }

    fn unmount(&self, mount_point: &Path) -> storage_sys::Result<()> {
        self.mounted.borrow_mut().remove(mount_point);
        Ok(())
    }
}

/// A fake root: device files under `dev/`, tables under `etc/`, mount points
/// anywhere else
pub struct Fixture {
    pub temp: TempDir,
    pub runner: Rc<FakeRunner>,
    pub mounter: Rc<FakeMounter>,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(temp.path().join("dev/block")).expect("create dev dir");
        fs::create_dir_all(temp.path().join("etc")).expect("create etc dir");

        Self {
            temp,
            runner: Rc::new(FakeRunner::default()),
            mounter: Rc::new(FakeMounter::default()),
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp.path().join(relative)
    }

    /// Absolute path string for `relative`
    pub fn abs(&self, relative: &str) -> String {
        self.path(relative).to_string_lossy().into_owned()
    }

    /// Create a readable fake device node and return its path
    pub fn device(&self, name: &str) -> String {
        let path = self.path(&format!("dev/block/{name}"));
        fs::write(&path, [0u8; 512]).expect("write device file");
        path.to_string_lossy().into_owned()
    }

    pub fn write_recovery_fstab(&self, contents: &str) {
        fs::write(self.path("etc/recovery.fstab"), contents).expect("write recovery.fstab");
    }

    /// Write `/proc/emmc` rows for `(device name, label)` pairs
    pub fn write_emmc(&self, rows: &[(&str, &str)]) {
        let mut listing = String::from("dev:        size     erasesize name\n");
        for (device, label) in rows {
            listing.push_str(&format!("{device}: 00400000 00000200 \"{label}\"\n"));
        }
        fs::create_dir_all(self.path("proc")).expect("create proc dir");
        fs::write(self.path("proc/emmc"), listing).expect("write emmc listing");
    }

    pub fn set_blkid(&self, output: &str) {
        *self.runner.blkid.borrow_mut() = output.to_string();
    }

    pub fn config(&self) -> VolumesConfig {
        VolumesConfig {
            block_dir: self.path("dev/block"),
            recovery_fstab: self.path("etc/recovery.fstab"),
            runtime_fstab: self.path("etc/fstab"),
            emmc_info: self.path("proc/emmc"),
            partitions_info: self.path("proc/partitions"),
            data_mount_point: self.abs("data"),
            media_dir: self.abs("data/media"),
            mke2fs: self.path("sbin/mke2fs"),
            special_partitions: Vec::new(),
            ..VolumesConfig::default()
        }
    }

    pub fn registry(&self, config: VolumesConfig) -> VolumeRegistry {
        VolumeRegistry::with_system(config, self.runner.clone(), self.mounter.clone())
    }
}
