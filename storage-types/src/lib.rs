// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for recovery storage volumes
//!
//! These types are shared by every layer of the stack:
//!
//! - **storage-sys**: takes a [`FilesystemType`] when mounting and formatting
//! - **storage-volumes**: classifies devices into these types
//! - **storage-cli**: prints [`VolumeSummary`] values as a table or JSON

pub mod backup;
pub mod common;
pub mod filesystem;
pub mod special;
pub mod volume;

pub use backup::BackupMethod;
pub use common::{bytes_to_kib, bytes_to_pretty};
pub use filesystem::FilesystemType;
pub use special::{MAX_SPECIAL_PARTITIONS, SpecialPartition};
pub use volume::{MemoryKind, VolumeSummary};
