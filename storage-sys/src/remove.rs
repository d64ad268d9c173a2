// SPDX-License-Identifier: GPL-3.0-only

//! Recursive removal of directory contents, used to "format" volumes whose
//! filesystem is not recreated by an external tool.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Result, SysError};

/// Delete everything inside `root`, leaving `root` itself in place.
///
/// A directory equal to `protected` is skipped entirely: neither it nor
/// anything below it is touched. Symbolic links are removed, never followed.
/// Removal keeps going past individual failures and reports how many entries
/// could not be removed. A missing `root` is not an error.
pub fn remove_contents(root: &Path, protected: Option<&Path>) -> Result<()> {
    debug!(root = %root.display(), protected = ?protected, "Removing directory contents");

    let mut failures = 0_u64;
    match remove_tree_contents(root, protected, &mut failures) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(SysError::Io(e)),
    }

    if failures > 0 {
        return Err(SysError::OperationFailed(format!(
            "{failures} entries under {} could not be removed",
            root.display()
        )));
    }

    Ok(())
}

fn remove_tree_contents(
    directory: &Path,
    protected: Option<&Path>,
    failures: &mut u64,
) -> io::Result<()> {
    for entry in fs::read_dir(directory)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(directory = %directory.display(), "Unreadable directory entry: {e}");
                *failures += 1;
                continue;
            }
        };

        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                warn!(path = %path.display(), "Cannot stat entry: {e}");
                *failures += 1;
                continue;
            }
        };

        if file_type.is_dir() {
            if protected.is_some_and(|protected| protected == path) {
                debug!(path = %path.display(), "Keeping protected directory");
                continue;
            }

            if let Err(e) = remove_tree_contents(&path, protected, failures) {
                warn!(path = %path.display(), "Cannot read directory: {e}");
                *failures += 1;
                continue;
            }
            if let Err(e) = fs::remove_dir(&path) {
                warn!(path = %path.display(), "Cannot remove directory: {e}");
                *failures += 1;
            }
        } else if let Err(e) = fs::remove_file(&path) {
            warn!(path = %path.display(), "Cannot remove file: {e}");
            *failures += 1;
        }
    }

    Ok(())
}
