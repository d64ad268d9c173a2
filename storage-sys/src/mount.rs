// SPDX-License-Identifier: GPL-3.0-only

//! mount(2)/umount(2) wrappers and mount-point detection.

use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use nix::errno::Errno;
use nix::mount::{MsFlags, umount};
use tracing::{debug, info};

use crate::error::{Result, SysError};

/// Mount operations a volume needs from the system
pub trait Mounter {
    fn is_mounted(&self, mount_point: &Path) -> bool;
    fn mount(&self, device: &str, mount_point: &Path, fs_type: &str) -> Result<()>;
    fn unmount(&self, mount_point: &Path) -> Result<()>;
}

/// [`Mounter`] backed by mount(2) and umount(2)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemMounter;

impl Mounter for SystemMounter {
    fn is_mounted(&self, mount_point: &Path) -> bool {
        is_mounted(mount_point)
    }

    fn mount(&self, device: &str, mount_point: &Path, fs_type: &str) -> Result<()> {
        mount(device, mount_point, fs_type)
    }

    fn unmount(&self, mount_point: &Path) -> Result<()> {
        unmount(mount_point)
    }
}

/// Whether something is mounted on `mount_point`.
///
/// A directory is a mount point when it lives on a different device than its
/// parent. Paths that cannot be stat'ed are reported as not mounted.
pub fn is_mounted(mount_point: &Path) -> bool {
    if mount_point.as_os_str().is_empty() {
        return false;
    }

    let Ok(own) = fs::metadata(mount_point) else {
        return false;
    };
    let Ok(parent) = fs::metadata(mount_point.join("..")) else {
        return false;
    };

    own.dev() != parent.dev()
}

/// Mount `device` on `mount_point` as `fs_type`. Already mounted is success.
pub fn mount(device: &str, mount_point: &Path, fs_type: &str) -> Result<()> {
    if device.is_empty() || mount_point.as_os_str().is_empty() {
        return Err(SysError::OperationFailed(format!(
            "cannot mount {device:?} on {}: missing device or mount point",
            mount_point.display()
        )));
    }

    if is_mounted(mount_point) {
        debug!(mount_point = %mount_point.display(), "Already mounted");
        return Ok(());
    }

    info!(device, mount_point = %mount_point.display(), fs_type, "Mounting filesystem");
    nix::mount::mount(
        Some(device),
        mount_point,
        Some(fs_type),
        MsFlags::empty(),
        None::<&str>,
    )
    .map_err(|e| match e {
        Errno::EPERM | Errno::EACCES => SysError::PermissionDenied(format!(
            "mount {device} on {}",
            mount_point.display()
        )),
        other => SysError::Nix(other),
    })?;

    Ok(())
}

/// Unmount whatever is on `mount_point`. Not mounted is success.
pub fn unmount(mount_point: &Path) -> Result<()> {
    if mount_point.as_os_str().is_empty() {
        return Err(SysError::OperationFailed(
            "cannot unmount an empty mount point".to_string(),
        ));
    }

    if !is_mounted(mount_point) {
        debug!(mount_point = %mount_point.display(), "Not mounted");
        return Ok(());
    }

    info!(mount_point = %mount_point.display(), "Unmounting filesystem");
    umount(mount_point)?;
    Ok(())
}
