//! Common utility functions shared across models

use num_format::{Locale, ToFormattedString};

/// Convert bytes to human-readable format (e.g., "1.50 GB")
pub fn bytes_to_pretty(bytes: u64, add_bytes: bool) -> String {
    let mut steps = 0;
    let mut val: f64 = bytes as f64;

    while val > 1024. && steps < 8 {
        val /= 1024.;
        steps += 1;
    }

    let unit = match steps {
        0 => "B",
        1 => "KB",
        2 => "MB",
        3 => "GB",
        4 => "TB",
        5 => "PB",
        6 => "EB",
        7 => "ZB",
        _ => "YB",
    };

    if add_bytes {
        let bytes_str = bytes.to_formatted_string(&Locale::en);
        format!("{:.2} {} ({} bytes)", val, unit, bytes_str)
    } else {
        format!("{:.2} {}", val, unit)
    }
}

/// Whole KiB, as shown in the volume table
pub fn bytes_to_kib(bytes: u64) -> u64 {
    bytes / 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_prints_units() {
        assert_eq!(bytes_to_pretty(512, false), "512.00 B");
        assert_eq!(bytes_to_pretty(1536, false), "1.50 KB");
        assert_eq!(
            bytes_to_pretty(3 * 1024 * 1024, true),
            "3.00 MB (3,145,728 bytes)"
        );
    }

    #[test]
    fn kib_truncates() {
        assert_eq!(bytes_to_kib(2047), 1);
    }
}
