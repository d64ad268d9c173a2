// SPDX-License-Identifier: GPL-3.0-only

mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use storage_types::{FilesystemType, bytes_to_pretty};
use storage_volumes::{Volume, VolumeError, VolumeRegistry, VolumesConfig, render_table};

#[derive(Debug, Parser)]
#[command(name = "recovery-volumes")]
#[command(about = "Inspect and manage the storage volumes of a recovery image")]
struct Args {
    /// TOML file overriding the stock device layout
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rebuild the volume list and print it
    List {
        #[arg(long)]
        json: bool,
    },

    /// Print the volume answering to a name, mount point or device
    Find { name: String },

    Mount { name: String },

    Unmount { name: String },

    /// Print the bytes in use on a volume, mounting it if needed
    Used {
        name: String,

        #[arg(long)]
        pretty: bool,
    },

    /// Wipe a volume, keeping its filesystem type
    Format {
        name: String,

        /// Must match the current type when given
        #[arg(long, value_parser = parse_fs_type)]
        fs_type: Option<FilesystemType>,
    },

    /// Rebuild and print the runtime fstab
    Fstab,

    /// Print the probed filesystem type of a device
    Probe { device: String },
}

fn parse_fs_type(value: &str) -> std::result::Result<FilesystemType, String> {
    let fs_type = FilesystemType::parse(value);
    if fs_type == FilesystemType::Unknown && value != FilesystemType::Unknown.as_str() {
        let known: Vec<&str> = FilesystemType::ALL.iter().map(|t| t.as_str()).collect();
        return Err(format!("expected one of {}", known.join(", ")));
    }
    Ok(fs_type)
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_file.as_deref());

    let config = match &args.config {
        Some(path) => VolumesConfig::load(path)?,
        None => VolumesConfig::default(),
    };
    let mut registry = VolumeRegistry::new(config);

    match args.command {
        Command::List { json } => {
            registry
                .load_volumes()
                .context("Failed to scan block devices")?;
            let summaries = registry.summaries();

            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                print!("{}", render_table(&summaries));
            }
        }
        Command::Find { name } => {
            let volume = lookup(&mut registry, &name)?;
            println!("{}", serde_json::to_string_pretty(&volume.summary())?);
        }
        Command::Mount { name } => {
            let volume = lookup(&mut registry, &name)?;
            volume
                .mount()
                .with_context(|| format!("Failed to mount {name}"))?;
            tracing::info!(volume = %volume.display_name(), "Mounted");
        }
        Command::Unmount { name } => {
            let volume = lookup(&mut registry, &name)?;
            volume
                .unmount()
                .with_context(|| format!("Failed to unmount {name}"))?;
            tracing::info!(volume = %volume.display_name(), "Unmounted");
        }
        Command::Used { name, pretty } => {
            let volume = lookup(&mut registry, &name)?;
            let used = volume
                .used_bytes()
                .with_context(|| format!("Failed to compute used bytes of {name}"))?;

            if pretty {
                println!("{}", bytes_to_pretty(used, true));
            } else {
                println!("{used}");
            }
        }
        Command::Format { name, fs_type } => {
            registry
                .format_volume(&name, fs_type.unwrap_or_default())
                .with_context(|| format!("Failed to format {name}"))?;
            tracing::info!(volume = %name, "Formatted");
        }
        Command::Fstab => {
            registry
                .load_volumes()
                .context("Failed to scan block devices")?;
            print!("{}", registry.runtime_fstab().render());
            tracing::info!(
                path = %registry.config().runtime_fstab.display(),
                "Runtime fstab written"
            );
        }
        Command::Probe { device } => {
            println!("{}", registry.probe(&device));
        }
    }

    Ok(())
}

fn lookup<'a>(registry: &'a mut VolumeRegistry, name: &str) -> Result<&'a Volume> {
    Ok(registry
        .find_volume(name)
        .ok_or_else(|| VolumeError::NotFound(name.to_string()))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_type_argument_accepts_known_names_only() {
        assert_eq!(parse_fs_type("ext3"), Ok(FilesystemType::Ext3));
        assert_eq!(parse_fs_type("unknown"), Ok(FilesystemType::Unknown));
        assert!(parse_fs_type("ntfs").is_err());
    }

    #[test]
    fn global_flags_parse_after_the_subcommand() {
        let args = Args::try_parse_from([
            "recovery-volumes",
            "format",
            "/cache",
            "--fs-type",
            "ext4",
            "--config",
            "/etc/volumes.toml",
        ])
        .expect("arguments parse");

        assert_eq!(args.config, Some(PathBuf::from("/etc/volumes.toml")));
        assert!(matches!(
            args.command,
            Command::Format {
                fs_type: Some(FilesystemType::Ext4),
                ..
            }
        ));
    }
}
