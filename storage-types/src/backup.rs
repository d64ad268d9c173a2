// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a volume's contents are preserved by a backup engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupMethod {
    #[default]
    Unknown,

    /// Not backed up at all
    None,

    /// Raw block copy of the device
    Image,

    /// Tree copy of the mounted filesystem
    Files,
}

impl BackupMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::None => "none",
            Self::Image => "image",
            Self::Files => "files",
        }
    }

    /// Parse from configuration text. Anything unrecognized is `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "none" => Self::None,
            "image" => Self::Image,
            "files" => Self::Files,
            _ => Self::Unknown,
        }
    }

    /// `None` and `Unknown` both mean there is nothing a backup engine can do
    pub fn is_backed_up(self) -> bool {
        matches!(self, Self::Image | Self::Files)
    }
}

impl fmt::Display for BackupMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
