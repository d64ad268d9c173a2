// SPDX-License-Identifier: GPL-3.0-only

//! Static mount table: the build's `recovery.fstab` and the generated runtime
//! `fstab`.
//!
//! Two positional layouts are understood:
//!
//! ```text
//! # recovery layout: mount-point fs-type device [fallback-device]
//! /cache   ext4  /dev/block/mmcblk0p5  /dev/block/mmcblk0p5alt
//!
//! # generic layout: device mount-point fs-type [flags...]
//! /dev/block/mmcblk0p5 /cache ext4 rw
//! ```

use std::fs;
use std::path::Path;

use storage_sys::{is_device_available, readlink_recursive};
use tracing::{debug, info, warn};

use crate::error::{Result, VolumeError};

/// Lines shorter than this cannot hold three fields and are skipped
const MIN_LINE_LEN: usize = 7;

/// Column order of a table file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FstabLayout {
    /// `mount-point fs-type device [fallback-device]`
    Recovery,

    /// `device mount-point fs-type [flags...]`
    Generic,
}

impl FstabLayout {
    /// Recovery layout for files named like `recovery.fstab`, generic otherwise
    pub fn for_path(path: &Path) -> Self {
        let is_recovery = path
            .file_name()
            .map(|name| name.to_string_lossy().contains("recovery.fstab"))
            .unwrap_or(false);

        if is_recovery {
            Self::Recovery
        } else {
            Self::Generic
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FstabEntry {
    mount_point: String,
    fs_type: String,
    device: String,
    mountable: bool,
}

impl FstabEntry {
    pub fn new(
        mount_point: impl Into<String>,
        fs_type: impl Into<String>,
        device: impl Into<String>,
        mountable: bool,
    ) -> Self {
        Self {
            mount_point: mount_point.into(),
            fs_type: fs_type.into(),
            device: device.into(),
            mountable,
        }
    }

    pub fn mount_point(&self) -> &str {
        &self.mount_point
    }

    pub fn fs_type(&self) -> &str {
        &self.fs_type
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn is_mountable(&self) -> bool {
        self.mountable
    }

    pub fn set_fs_type(&mut self, fs_type: impl Into<String>) {
        self.fs_type = fs_type.into();
    }

    pub fn set_mountable(&mut self, mountable: bool) {
        self.mountable = mountable;
    }

    fn matches(&self, name: &str) -> bool {
        self.mount_point == name || self.device == name
    }
}

/// Ordered table entries. Duplicates are kept; lookups return the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fstab {
    entries: Vec<FstabEntry>,
}

impl Fstab {
    /// Load `path` with the layout implied by its file name.
    ///
    /// A missing or unreadable file gives an empty table.
    pub fn load(path: &Path) -> Self {
        Self::load_with_layout(path, FstabLayout::for_path(path))
    }

    pub fn load_with_layout(path: &Path, layout: FstabLayout) -> Self {
        match fs::read_to_string(path) {
            Ok(input) => {
                info!(path = %path.display(), ?layout, "Loading fstab");
                Self::parse(&input, layout)
            }
            Err(e) => {
                warn!(path = %path.display(), "Cannot read fstab: {e}");
                Self::default()
            }
        }
    }

    /// Parse table text, skipping comments and malformed lines
    pub fn parse(input: &str, layout: FstabLayout) -> Self {
        let mut entries = Vec::new();

        for (index, line) in input.lines().enumerate() {
            match parse_line(index + 1, line, layout) {
                Ok(entry) => {
                    debug!(
                        mount_point = entry.mount_point(),
                        fs_type = entry.fs_type(),
                        device = entry.device(),
                        "FSTAB entry"
                    );
                    entries.push(entry);
                }
                Err(skip) => debug!("{skip}"),
            }
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[FstabEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry whose mount point or device equals `name`
    pub fn entry(&self, name: &str) -> Option<&FstabEntry> {
        self.entries.iter().find(|entry| entry.matches(name))
    }

    pub fn entry_mut(&mut self, name: &str) -> Option<&mut FstabEntry> {
        self.entries.iter_mut().find(|entry| entry.matches(name))
    }

    /// Runtime table text: one `device mount-point fs-type rw` line per
    /// mountable entry
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .filter(|entry| entry.mountable)
            .map(|entry| {
                format!(
                    "{} {} {} rw\n",
                    entry.device, entry.mount_point, entry.fs_type
                )
            })
            .collect()
    }

    /// Overwrite `path` with [`Fstab::render`]
    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render())?;
        info!(path = %path.display(), "Wrote fstab");
        Ok(())
    }
}

/// Parse one table line. Comments, short lines and lines with fewer than
/// three fields are reported as [`VolumeError::ParseSkip`].
pub fn parse_line(line_number: usize, line: &str, layout: FstabLayout) -> Result<FstabEntry> {
    let skip = |reason: &str| VolumeError::ParseSkip {
        line: line_number,
        reason: reason.to_string(),
    };

    let trimmed = line.trim();
    if trimmed.starts_with('#') {
        return Err(skip("comment"));
    }
    if trimmed.len() < MIN_LINE_LEN {
        return Err(skip("line too short"));
    }

    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(skip("fewer than three fields"));
    }

    let entry = match layout {
        FstabLayout::Recovery => {
            let (mount_point, fs_type, primary) = (fields[0], fields[1], fields[2]);
            let device = match fields.get(3) {
                Some(fallback) if !is_device_available(primary) => {
                    info!(
                        mount_point,
                        primary, fallback, "Primary device unavailable, using fallback"
                    );
                    *fallback
                }
                _ => primary,
            };
            FstabEntry::new(mount_point, fs_type, readlink_recursive(device), false)
        }
        FstabLayout::Generic => {
            let (device, mount_point, fs_type) = (fields[0], fields[1], fields[2]);
            FstabEntry::new(mount_point, fs_type, readlink_recursive(device), true)
        }
    };

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_follows_file_name() {
        assert_eq!(
            FstabLayout::for_path(Path::new("/etc/recovery.fstab")),
            FstabLayout::Recovery
        );
        assert_eq!(
            FstabLayout::for_path(Path::new("/etc/fstab")),
            FstabLayout::Generic
        );
    }

    #[test]
    fn skips_comments_and_short_lines() {
        let table = Fstab::parse(
            "# mount point  fstype  device\n\n/a b\n/system ext4 /dev/block/mmcblk0p25\n",
            FstabLayout::Recovery,
        );

        assert_eq!(table.entries().len(), 1);
        assert_eq!(table.entries()[0].mount_point(), "/system");
        assert!(!table.entries()[0].is_mountable());
    }

    #[test]
    fn skip_reports_line_number() {
        let err = parse_line(4, "/misc emmc", FstabLayout::Recovery).expect_err("two fields");
        assert!(matches!(err, VolumeError::ParseSkip { line: 4, .. }));
    }

    #[test]
    fn generic_layout_columns() {
        let entry = parse_line(1, "/dev/block/mmcblk0p5 /cache ext4 rw", FstabLayout::Generic)
            .expect("generic line parses");

        assert_eq!(entry.device(), "/dev/block/mmcblk0p5");
        assert_eq!(entry.mount_point(), "/cache");
        assert_eq!(entry.fs_type(), "ext4");
        assert!(entry.is_mountable());
    }

    #[test]
    fn unavailable_primary_switches_to_fallback() {
        let table = Fstab::parse(
            "/cache ext4 /dev/block/mmcblk0p5 /dev/block/mmcblk0p5alt\n",
            FstabLayout::Recovery,
        );

        let entry = table.entry("/cache").expect("cache entry");
        assert_eq!(entry.device(), "/dev/block/mmcblk0p5alt");
    }

    #[test]
    fn readable_primary_is_kept() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let primary = temp.path().join("mmcblk0p5");
        fs::write(&primary, [0u8; 512]).expect("write primary device");

        let line = format!(
            "/cache ext4 {} /dev/block/mmcblk0p5alt",
            primary.display()
        );
        let entry = parse_line(1, &line, FstabLayout::Recovery).expect("line parses");
        assert_eq!(entry.device(), primary.to_string_lossy());
    }

    #[test]
    fn first_match_wins_on_duplicates() {
        let table = Fstab::parse(
            "/sdcard vfat /dev/block/mmcblk1p1\n/sdcard vfat /dev/block/mmcblk1\n",
            FstabLayout::Recovery,
        );

        assert_eq!(table.entries().len(), 2);
        assert_eq!(
            table.entry("/sdcard").map(FstabEntry::device),
            Some("/dev/block/mmcblk1p1")
        );
        assert_eq!(
            table.entry("/dev/block/mmcblk1").map(FstabEntry::mount_point),
            Some("/sdcard")
        );
    }

    #[test]
    fn render_omits_unmountable_entries() {
        let mut table = Fstab::parse(
            "/boot emmc /dev/block/mmcblk0p22\n/system ext4 /dev/block/mmcblk0p25\n/data ext4 /dev/block/mmcblk0p26\n",
            FstabLayout::Recovery,
        );
        table
            .entry_mut("/system")
            .expect("system entry")
            .set_mountable(true);
        let data = table.entry_mut("/data").expect("data entry");
        data.set_mountable(true);
        data.set_fs_type("ext3");

        assert_eq!(
            table.render(),
            "/dev/block/mmcblk0p25 /system ext4 rw\n/dev/block/mmcblk0p26 /data ext3 rw\n"
        );
    }

    #[test]
    fn missing_file_is_empty_table() {
        assert!(Fstab::load(Path::new("/nonexistent/recovery.fstab")).is_empty());
    }
}
