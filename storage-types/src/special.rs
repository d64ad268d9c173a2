// SPDX-License-Identifier: GPL-3.0-only

//! Device-specific partitions whose classification is fixed by the build.
//!
//! Some devices carry partitions with non-standard labels (radio firmware,
//! WiMAX calibration data, ...) that the generic classification would get
//! wrong. A build can name up to [`MAX_SPECIAL_PARTITIONS`] of them through
//! the `SP1_*`, `SP2_*` and `SP3_*` compile-time environment variables, or
//! list them in the volumes configuration file.

use serde::{Deserialize, Serialize};

use crate::BackupMethod;

/// Number of override slots a build can fill
pub const MAX_SPECIAL_PARTITIONS: usize = 3;

/// Override applied to a volume whose label equals `name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialPartition {
    /// Label to match exactly
    pub name: String,

    /// Display name to report instead of the derived one
    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default = "default_backup_method")]
    pub backup_method: BackupMethod,

    #[serde(default)]
    pub mountable: bool,
}

fn default_backup_method() -> BackupMethod {
    BackupMethod::None
}

impl SpecialPartition {
    pub fn new(name: impl Into<String>, backup_method: BackupMethod, mountable: bool) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            backup_method,
            mountable,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Display name reported for a matching volume (falls back to the label)
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Slots filled in at compile time. Unset or empty `SPn_NAME` leaves the slot out.
    pub fn from_build_env() -> Vec<SpecialPartition> {
        let slots = [
            (
                option_env!("SP1_NAME"),
                option_env!("SP1_DISPLAY_NAME"),
                option_env!("SP1_BACKUP_METHOD"),
                option_env!("SP1_MOUNTABLE"),
            ),
            (
                option_env!("SP2_NAME"),
                option_env!("SP2_DISPLAY_NAME"),
                option_env!("SP2_BACKUP_METHOD"),
                option_env!("SP2_MOUNTABLE"),
            ),
            (
                option_env!("SP3_NAME"),
                option_env!("SP3_DISPLAY_NAME"),
                option_env!("SP3_BACKUP_METHOD"),
                option_env!("SP3_MOUNTABLE"),
            ),
        ];

        slots
            .into_iter()
            .filter_map(|(name, display_name, backup_method, mountable)| {
                from_slot(name?, display_name, backup_method, mountable)
            })
            .collect()
    }
}

fn from_slot(
    name: &str,
    display_name: Option<&str>,
    backup_method: Option<&str>,
    mountable: Option<&str>,
) -> Option<SpecialPartition> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    Some(SpecialPartition {
        name: name.to_string(),
        display_name: display_name
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToString::to_string),
        backup_method: backup_method.map_or(BackupMethod::None, BackupMethod::parse),
        mountable: mountable.is_some_and(|value| matches!(value.trim(), "1" | "true" | "yes")),
    })
}
