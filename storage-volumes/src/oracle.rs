// SPDX-License-Identifier: GPL-3.0-only

//! Cached device to filesystem-type classification backed by `blkid`.
//!
//! The probe runs once and its whole output is cached. Lookups afterwards
//! never re-run it: a device that appears or changes type after the probe
//! reads as [`FilesystemType::Unknown`] (or its old type) until
//! [`FsTypeOracle::refresh`] is called.

use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use storage_sys::CommandRunner;
use storage_types::FilesystemType;
use tracing::{debug, info, warn};

pub struct FsTypeOracle {
    runner: Rc<dyn CommandRunner>,
    program: PathBuf,
    cache: Option<HashMap<String, FilesystemType>>,
}

impl FsTypeOracle {
    pub fn new(runner: Rc<dyn CommandRunner>, program: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            program: program.into(),
            cache: None,
        }
    }

    /// Filesystem type of `device`, probing first if the cache is empty
    pub fn fs_type(&mut self, device: &str) -> FilesystemType {
        if !self.is_populated() {
            self.refresh();
        }

        self.cache
            .as_ref()
            .and_then(|cache| cache.get(device).copied())
            .unwrap_or_default()
    }

    /// Discard the cache and run the probe again.
    ///
    /// When the probe cannot run, the cache stays empty and the next lookup
    /// retries.
    pub fn refresh(&mut self) {
        self.cache = None;

        let output = match self.runner.run(&self.program, &[]) {
            Ok(output) => output,
            Err(e) => {
                warn!(program = %self.program.display(), "Filesystem probe failed: {e}");
                return;
            }
        };

        // blkid exits 2 when it found nothing, which is still a valid answer
        if !output.success() && output.stdout.trim().is_empty() && output.status != Some(2) {
            warn!(
                program = %self.program.display(),
                status = ?output.status,
                "Filesystem probe failed: {}",
                output.stderr.trim()
            );
            return;
        }

        let cache = parse_probe_output(&output.stdout);
        info!(devices = cache.len(), "Filesystem type cache refreshed");
        self.cache = Some(cache);
    }

    pub fn is_populated(&self) -> bool {
        self.cache.is_some()
    }
}

/// Parse `device: KEY="value" ...` lines into a device to type map.
///
/// Only the `TYPE` key counts; `SEC_TYPE`, `PTTYPE` and friends are ignored.
/// Lines without a `TYPE` are left out.
pub fn parse_probe_output(output: &str) -> HashMap<String, FilesystemType> {
    let mut cache = HashMap::new();

    for line in output.lines() {
        let Some((device, attributes)) = line.split_once(':') else {
            continue;
        };
        let device = device.trim();
        if device.is_empty() {
            continue;
        }

        let Some(fs_type) = parse_attributes(attributes)
            .into_iter()
            .find_map(|(key, value)| (key == "TYPE").then_some(value))
        else {
            continue;
        };

        debug!(device, fs_type, "Probed filesystem type");
        cache.insert(device.to_string(), FilesystemType::parse(fs_type));
    }

    cache
}

/// Split `KEY="value" KEY2=value2` into pairs, honouring quoted spaces
fn parse_attributes(input: &str) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();
    let mut rest = input.trim_start();

    while !rest.is_empty() {
        let Some(eq) = rest.find('=') else {
            break;
        };
        let key = rest[..eq].trim();
        let after = &rest[eq + 1..];

        let (value, remainder) = if let Some(quoted) = after.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            }
        } else {
            match after.find(char::is_whitespace) {
                Some(end) => (&after[..end], &after[end..]),
                None => (after, ""),
            }
        };

        // a key is the last whitespace-separated word before '='
        let key = key.rsplit(char::is_whitespace).next().unwrap_or(key);
        pairs.push((key, value));
        rest = remainder.trim_start();
    }

    pairs
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::path::Path;

    use storage_sys::{CommandOutput, SysError};

    use super::*;

    struct FakeBlkid {
        stdout: String,
        calls: Cell<usize>,
    }

    impl FakeBlkid {
        fn new(stdout: &str) -> Rc<Self> {
            Rc::new(Self {
                stdout: stdout.to_string(),
                calls: Cell::new(0),
            })
        }
    }

    impl CommandRunner for FakeBlkid {
        fn run(&self, _program: &Path, _args: &[String]) -> storage_sys::Result<CommandOutput> {
            self.calls.set(self.calls.get() + 1);
            Ok(CommandOutput {
                status: Some(0),
                stdout: self.stdout.clone(),
                stderr: String::new(),
            })
        }
    }

    struct MissingBlkid;

    impl CommandRunner for MissingBlkid {
        fn run(&self, program: &Path, _args: &[String]) -> storage_sys::Result<CommandOutput> {
            Err(SysError::ToolMissing(program.display().to_string()))
        }
    }

    #[test]
    fn cached_type_and_unknown_for_unseen_devices() {
        let blkid = FakeBlkid::new("/dev/block/mmcblk0p1: TYPE=\"vfat\"\n");
        let mut oracle = FsTypeOracle::new(blkid.clone(), "blkid");

        assert_eq!(oracle.fs_type("/dev/block/mmcblk0p1"), FilesystemType::Vfat);
        assert_eq!(oracle.fs_type("/dev/block/mmcblk0p2"), FilesystemType::Unknown);
        assert_eq!(oracle.fs_type("/dev/block/mmcblk0p1 "), FilesystemType::Unknown);
        assert_eq!(blkid.calls.get(), 1);
    }

    #[test]
    fn refresh_probes_again() {
        let blkid = FakeBlkid::new("/dev/block/mmcblk0p1: TYPE=\"vfat\"\n");
        let mut oracle = FsTypeOracle::new(blkid.clone(), "blkid");

        oracle.fs_type("/dev/block/mmcblk0p1");
        oracle.refresh();
        oracle.fs_type("/dev/block/mmcblk0p1");
        assert_eq!(blkid.calls.get(), 2);
    }

    #[test]
    fn failed_probe_leaves_cache_empty() {
        let mut oracle = FsTypeOracle::new(Rc::new(MissingBlkid), "blkid");

        assert_eq!(oracle.fs_type("/dev/block/mmcblk0p1"), FilesystemType::Unknown);
        assert!(!oracle.is_populated());
    }

    #[test]
    fn only_the_type_key_is_used() {
        let cache = parse_probe_output(concat!(
            "/dev/block/mmcblk1p1: LABEL=\"MY CARD\" SEC_TYPE=\"msdos\" UUID=\"1234-ABCD\" TYPE=\"vfat\"\n",
            "/dev/block/mmcblk0: PTUUID=\"98101b32\" PTTYPE=\"dos\"\n",
            "/dev/block/mmcblk0p25: UUID=\"57f8f4bc\" TYPE=\"ext4\"\n",
            "/dev/block/mmcblk0p3: TYPE=\"squashfs\"\n",
        ));

        assert_eq!(cache.get("/dev/block/mmcblk1p1"), Some(&FilesystemType::Vfat));
        assert_eq!(cache.get("/dev/block/mmcblk0p25"), Some(&FilesystemType::Ext4));
        assert_eq!(cache.get("/dev/block/mmcblk0p3"), Some(&FilesystemType::Unknown));
        assert!(!cache.contains_key("/dev/block/mmcblk0"));
    }

    #[test]
    fn unquoted_values_are_accepted() {
        let cache = parse_probe_output("/dev/block/mtdblock3: TYPE=yaffs2\n");
        assert_eq!(cache.get("/dev/block/mtdblock3"), Some(&FilesystemType::Yaffs2));
    }
}
