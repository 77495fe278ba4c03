//! Subprocess helpers
//!
//! Commands are always spawned from an argument vector, never through a
//! shell, so model supplied values cannot change what gets executed.

use super::ToolError;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Captured result of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Run `program` with `args` in `cwd` and wait for it
pub async fn run(program: &str, args: &[&str], cwd: &Path) -> Result<CommandOutput, ToolError> {
    debug!(program, ?args, cwd = %cwd.display(), "Running command");

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| ToolError::Command {
            command: display_command(program, args),
            message: e.to_string(),
        })?;

    Ok(CommandOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Run a command and turn a non-zero exit into [`ToolError::Command`]
pub async fn run_checked(
    program: &str,
    args: &[&str],
    cwd: &Path,
) -> Result<CommandOutput, ToolError> {
    let output = run(program, args, cwd).await?;
    if output.success() {
        return Ok(output);
    }

    let detail = if output.stderr.trim().is_empty() {
        output.stdout.trim()
    } else {
        output.stderr.trim()
    };

    Err(ToolError::Command {
        command: display_command(program, args),
        message: detail.to_string(),
    })
}

/// Human readable rendering of a command line, for error text only
pub fn display_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
