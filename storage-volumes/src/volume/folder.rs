// SPDX-License-Identifier: GPL-3.0-only

use std::path::Path;

use storage_sys::remove_contents;
use storage_types::FilesystemType;
use tracing::info;

use super::{Volume, check_format_type};
use crate::error::Result;

/// A directory inside another volume, such as the media folder embedded in
/// the data partition. Mounting goes to the wrapped volume.
#[derive(Debug, Clone)]
pub struct FolderVolume {
    base: Box<Volume>,
    directory: String,
    label: String,
}

impl FolderVolume {
    pub fn new(base: Volume, directory: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            base: Box::new(base),
            directory: directory.into(),
            label: label.into(),
        }
    }

    pub fn base(&self) -> &Volume {
        &self.base
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Delete the directory's contents, mounting the wrapped volume first
    pub fn format(&self, new_type: FilesystemType) -> Result<()> {
        check_format_type(&self.label, self.base.fs_type(), new_type)?;

        if self.base.is_mountable() {
            self.base.mount()?;
        }

        info!(volume = %self.label, directory = %self.directory, "Wiping folder volume");
        remove_contents(Path::new(&self.directory), None)?;
        Ok(())
    }
}
