// SPDX-License-Identifier: GPL-3.0-only

//! In-memory stand-ins for the external tools and mount(2).

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use storage_sys::{CommandOutput, CommandRunner, Mounter, SysError};

/// Answers `blkid` with canned output and records every other invocation
pub(crate) struct FakeRunner {
    blkid: String,
    calls: RefCell<Vec<(PathBuf, Vec<String>)>>,
}

impl FakeRunner {
    pub(crate) fn new(blkid: &str) -> Rc<Self> {
        Rc::new(Self {
            blkid: blkid.to_string(),
            calls: RefCell::new(Vec::new()),
        })
    }

    /// Invocations of anything that is not the probe
    pub(crate) fn formatter_calls(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, program: &Path, args: &[String]) -> storage_sys::Result<CommandOutput> {
        if program.file_name().is_some_and(|name| name == "blkid") {
            return Ok(CommandOutput {
                status: Some(0),
                stdout: self.blkid.clone(),
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

/// Tracks mount points in memory instead of calling mount(2)
#[derive(Default)]
pub(crate) struct FakeMounter {
    mounted: RefCell<HashSet<PathBuf>>,
    mounts: RefCell<Vec<(String, PathBuf, String)>>,
    refusal: RefCell<Option<String>>,
}

impl FakeMounter {
    /// Make every later mount fail with `reason`
    pub(crate) fn refuse_mounts(&self, reason: &str) {
        *self.refusal.borrow_mut() = Some(reason.to_string());
    }

    /// Every mount call as `(device, mount point, fs type)`
    pub(crate) fn mounts(&self) -> Vec<(String, PathBuf, String)> {
        self.mounts.borrow().clone()
    }
}

impl Mounter for FakeMounter {
    fn is_mounted(&self, mount_point: &Path) -> bool {
        self.mounted.borrow().contains(mount_point)
    }

    fn mount(&self, device: &str, mount_point: &Path, fs_type: &str) -> storage_sys::Result<()> {
        if let Some(reason) = self.refusal.borrow().as_ref() {
            return Err(SysError::OperationFailed(reason.clone()));
        }

        self.mounted.borrow_mut().insert(mount_point.to_path_buf());
        self.mounts.borrow_mut().push((
            device.to_string(),
            mount_point.to_path_buf(),
            fs_type.to_string(),
        ));
        Ok(())
    }

    fn unmount(&self, mount_point: &Path) -> storage_sys::Result<()> {
        self.mounted.borrow_mut().remove(mount_point);
        Ok(())
    }
}
