// SPDX-License-Identifier: GPL-3.0-only

//! Fixed-width volume table printed after every rebuild.

use std::fmt::Write;

use storage_types::{VolumeSummary, bytes_to_kib};

const HEADER: &str = "Name             Label            Memory Backup Fs     Mnt Mntbl Size(KiB)    Used(KiB)    Mount point / Block device / Memory device";

/// One line per volume under a header row
pub fn render_table(summaries: &[VolumeSummary]) -> String {
    let mut out = String::with_capacity(HEADER.len() * (summaries.len() + 1));
    out.push_str(HEADER);
    out.push('\n');

    for summary in summaries {
        let used = summary
            .used
            .map(|used| bytes_to_kib(used).to_string())
            .unwrap_or_else(|| "-".to_string());

        let _ = writeln!(
            out,
            "{:<16} {:<16} {:<6} {:<6} {:<6} {:<3} {:<5} {:>12} {:>12} {} {} {}",
            summary.display_name,
            summary.label,
            summary.memory.as_str(),
            summary.backup_method.as_str(),
            summary.fs_type.as_str(),
            yes_no(summary.mounted),
            yes_no(summary.mountable),
            bytes_to_kib(summary.size),
            used,
            summary.mount_point.as_deref().unwrap_or("-"),
            or_dash(&summary.block_device),
            or_dash(&summary.memory_device),
        );
    }

    out
}

fn yes_no(value: bool) -> &'static str {
    if value { "Y" } else { "N" }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

#[cfg(test)]
mod tests {
    use storage_types::{BackupMethod, FilesystemType, MemoryKind};

    use super::*;

    #[test]
    fn renders_one_row_per_volume() {
        let summary = VolumeSummary {
            display_name: "emmc".to_string(),
            label: "emmc".to_string(),
            memory: MemoryKind::Emmc,
            backup_method: BackupMethod::Files,
            fs_type: FilesystemType::Ext4,
            mount_point: Some("/data/media".to_string()),
            block_device: String::new(),
            memory_device: String::new(),
            mounted: true,
            mountable: true,
            size: 4096 * 1024,
            used: None,
        };

        let table = render_table(&[summary]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("emmc "));
        assert!(lines[1].contains("4096"));
        assert!(lines[1].ends_with("/data/media - -"));
    }
}
