// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Same limit the kernel applies to nested links during path resolution
const MAX_LINK_HOPS: usize = 40;

/// Follow a chain of symbolic links down to the final path.
///
/// `/dev/block/platform/.../by-name/system` style names resolve to the raw
/// device node. A path that is not a link (or does not exist) is returned
/// unchanged. Relative link targets are resolved against the link's directory.
pub fn readlink_recursive(path: &str) -> String {
    let mut current = PathBuf::from(path);

    for _ in 0..MAX_LINK_HOPS {
        let target = match fs::read_link(&current) {
            Ok(target) => target,
            Err(_) => return current.to_string_lossy().into_owned(),
        };

        current = if target.is_absolute() {
            target
        } else {
            current
                .parent()
                .unwrap_or_else(|| Path::new("/"))
                .join(target)
        };
    }

    warn!(path, "Symbolic link chain too deep, stopping resolution");
    current.to_string_lossy().into_owned()
}
