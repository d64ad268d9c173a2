// SPDX-License-Identifier: GPL-3.0-only

//! Subprocess invocation for the external probe and format tools.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::{Result, SysError};

/// Captured result of a finished child process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the child was killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Spawn a program, wait for it, and hand back its output.
///
/// Only failing to spawn is an error; a non-zero exit is reported through
/// [`CommandOutput::status`] so callers decide what it means.
pub trait CommandRunner {
    fn run(&self, program: &Path, args: &[String]) -> Result<CommandOutput>;
}

/// Runs programs with [`std::process::Command`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &Path, args: &[String]) -> Result<CommandOutput> {
        let rendered = render(program, args);
        debug!(command = %rendered, "Running external tool");

        let output = Command::new(program).args(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SysError::ToolMissing(program.display().to_string())
            } else {
                SysError::OperationFailed(format!("Failed to execute {rendered}: {e}"))
            }
        })?;

        let result = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        debug!(command = %rendered, status = ?result.status, "External tool finished");
        Ok(result)
    }
}

/// Command line as it would be typed, for log messages
pub fn render(program: &Path, args: &[String]) -> String {
    if args.is_empty() {
        program.display().to_string()
    } else {
        format!("{} {}", program.display(), args.join(" "))
    }
}
