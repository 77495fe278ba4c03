//! Project build tool
//!
//! Runs the configured build command for one of the known projects. Output
//! is captured incrementally, keeping only the last lines of each stream, so
//! a build that hits the timeout still reports what it printed before being
//! killed. One deadline covers both the build and reading its output.

use super::process::display_command;
use super::{parse_input, ParamKind, ParamSpec, Tool, ToolContext, ToolDefinition, ToolError};
use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::Instant;
use tracing::{info, warn};

/// How long reader tasks may keep draining after the child was killed
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Longest line kept whole; longer output without newlines is split
const MAX_LINE_BYTES: usize = 64 * 1024;

/// Builds a configured project
pub struct RunBuildTool;

#[derive(Deserialize)]
struct RunBuildInput {
    project: String,
}

#[async_trait]
impl Tool for RunBuildTool {
    fn name(&self) -> &'static str {
        "run_build"
    }

    fn definition(&self, ctx: &ToolContext) -> ToolDefinition {
        let projects: Vec<String> = ctx.build.projects.keys().cloned().collect();
        ToolDefinition {
            name: self.name(),
            description: "Run the build command to check for errors before committing.".to_string(),
            params: vec![ParamSpec::required(
                "project",
                ParamKind::Enum(projects.clone()),
                format!("Which project to build: {}", projects.join(", ")),
            )],
        }
    }

    async fn run(&self, ctx: &ToolContext, input: &Value) -> Result<String, ToolError> {
        let input: RunBuildInput = parse_input(input)?;
        let project = ctx
            .build
            .projects
            .get(&input.project)
            .ok_or_else(|| ToolError::UnknownProject(input.project.clone()))?;

        let Some((program, args)) = project.command.split_first() else {
            return Err(ToolError::InvalidInput(format!(
                "project {} has no build command",
                input.project
            )));
        };

        let cwd = ctx.root.resolve(&project.path.to_string_lossy())?;
        let timeout = Duration::from_millis(ctx.build.timeout_ms);
        let deadline = Instant::now() + timeout;
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let command_line = display_command(program, &arg_refs);

        info!(project = %input.project, command = %command_line, "Starting build");

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(&cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so descendants can be killed with the build
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| ToolError::Command {
            command: command_line.clone(),
            message: e.to_string(),
        })?;
        let pid = child.id();

        let capacity = ctx.build.tail_lines;
        let stdout = LineTail::shared(capacity);
        let stderr = LineTail::shared(capacity);
        let combined = LineTail::shared(capacity);
        let mut readers = Vec::new();
        if let Some(pipe) = child.stdout.take() {
            readers.push(tokio::spawn(drain(pipe, stdout.clone(), combined.clone())));
        }
        if let Some(pipe) = child.stderr.take() {
            readers.push(tokio::spawn(drain(pipe, stderr.clone(), combined.clone())));
        }

        let exit = match tokio::time::timeout_at(deadline, child.wait()).await {
            Ok(status) => {
                let status = status?;
                // Descendants may still hold the pipes open after the child exits
                let drain_deadline = deadline.min(Instant::now() + DRAIN_GRACE);
                if tokio::time::timeout_at(drain_deadline, join_all(readers))
                    .await
                    .is_err()
                {
                    warn!(project = %input.project, "Build left processes holding its output open, killing them");
                    kill_process_group(pid);
                }
                BuildExit::Finished(status.code())
            }
            Err(_) => {
                warn!(project = %input.project, timeout_ms = ctx.build.timeout_ms, "Build timed out, killing it");
                kill_process_group(pid);
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill build process");
                }
                let _ = tokio::time::timeout(DRAIN_GRACE, join_all(readers)).await;
                BuildExit::TimedOut(ctx.build.timeout_ms)
            }
        };

        if let BuildExit::Finished(Some(0)) = exit {
            info!(project = %input.project, "Build succeeded");
            return Ok(combined.lock().text());
        }

        info!(project = %input.project, exit = %exit, "Build failed");
        Ok(format!(
            "Build output:\n{}\n{}\nExit code: {}",
            stdout.lock().text(),
            stderr.lock().text(),
            exit
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildExit {
    Finished(Option<i32>),
    TimedOut(u64),
}

impl std::fmt::Display for BuildExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildExit::Finished(Some(code)) => write!(f, "{}", code),
            BuildExit::Finished(None) => write!(f, "terminated by signal"),
            BuildExit::TimedOut(ms) => write!(f, "killed (timed out after {} ms)", ms),
        }
    }
}

/// Last `capacity` lines of a stream
#[derive(Debug)]
struct LineTail {
    lines: VecDeque<String>,
    capacity: usize,
}

type SharedTail = Arc<Mutex<LineTail>>;

impl LineTail {
    fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn shared(capacity: usize) -> SharedTail {
        Arc::new(Mutex::new(Self::new(capacity)))
    }

    fn push(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    fn text(&self) -> String {
        self.lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}

/// Read a pipe to EOF, keeping only the tail of its lines
async fn drain<R: AsyncRead + Unpin>(mut reader: R, own: SharedTail, combined: SharedTail) {
    let mut chunk = [0u8; 4096];
    let mut pending: Vec<u8> = Vec::new();

    let emit = |bytes: &[u8]| {
        let line = String::from_utf8_lossy(bytes)
            .trim_end_matches(['\n', '\r'])
            .to_string();
        own.lock().push(line.clone());
        combined.lock().push(line);
    };

    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                pending.extend_from_slice(&chunk[..n]);
                while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = pending.drain(..=pos).collect();
                    emit(&line);
                }
                if pending.len() > MAX_LINE_BYTES {
                    emit(&pending);
                    pending.clear();
                }
            }
        }
    }

    if !pending.is_empty() {
        emit(&pending);
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid else { return };
    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
        Err(e) => warn!(error = %e, "Failed to kill build process group"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}
