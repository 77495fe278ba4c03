//! Git tools: status, diff, commit and push in the repository root

use super::process::run_checked;
use super::{parse_input, ParamKind, ParamSpec, Tool, ToolContext, ToolDefinition, ToolError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// Run git in the repository root and return stdout
async fn git(ctx: &ToolContext, args: &[&str]) -> Result<String, ToolError> {
    Ok(run_checked("git", args, ctx.root.path()).await?.stdout)
}

/// Convert model supplied file arguments into root-relative paths
fn relative_args(ctx: &ToolContext, files: &[String]) -> Result<Vec<String>, ToolError> {
    files
        .iter()
        .map(|file| {
            let resolved = ctx.root.resolve(file)?;
            let relative = ctx.root.relative(&resolved);
            Ok(if relative.as_os_str().is_empty() {
                ".".to_string()
            } else {
                relative.to_string_lossy().to_string()
            })
        })
        .collect()
}

/// `git status --short`
pub struct GitStatusTool;

#[async_trait]
impl Tool for GitStatusTool {
    fn name(&self) -> &'static str {
        "git_status"
    }

    fn definition(&self, _ctx: &ToolContext) -> ToolDefinition {
        ToolDefinition {
            name: self.name(),
            description: "Get the current git status showing modified, staged, and untracked files.".to_string(),
            params: vec![],
        }
    }

    async fn run(&self, ctx: &ToolContext, _input: &Value) -> Result<String, ToolError> {
        let stdout = git(ctx, &["status", "--short"]).await?;
        if stdout.trim().is_empty() {
            Ok("Working tree clean".to_string())
        } else {
            Ok(stdout)
        }
    }
}

/// `git diff`, optionally for one file
pub struct GitDiffTool;

#[derive(Deserialize)]
struct GitDiffInput {
    #[serde(default)]
    file: Option<String>,
}

#[async_trait]
impl Tool for GitDiffTool {
    fn name(&self) -> &'static str {
        "git_diff"
    }

    fn definition(&self, _ctx: &ToolContext) -> ToolDefinition {
        ToolDefinition {
            name: self.name(),
            description: "Show the diff of current changes.".to_string(),
            params: vec![ParamSpec::optional(
                "file",
                ParamKind::String,
                "Optional specific file to diff",
            )],
        }
    }

    async fn run(&self, ctx: &ToolContext, input: &Value) -> Result<String, ToolError> {
        let input: GitDiffInput = parse_input(input)?;

        let mut args = vec!["diff".to_string()];
        if let Some(file) = input.file.filter(|f| !f.is_empty()) {
            args.push("--".to_string());
            args.extend(relative_args(ctx, &[file])?);
        }

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let stdout = git(ctx, &args).await?;
        if stdout.trim().is_empty() {
            Ok("No changes".to_string())
        } else {
            Ok(stdout)
        }
    }
}

/// Stage files (or everything) and commit
pub struct GitCommitTool;

#[derive(Deserialize)]
struct GitCommitInput {
    message: String,
    #[serde(default)]
    files: Vec<String>,
}

#[async_trait]
impl Tool for GitCommitTool {
    fn name(&self) -> &'static str {
        "git_commit"
    }

    fn definition(&self, _ctx: &ToolContext) -> ToolDefinition {
        ToolDefinition {
            name: self.name(),
            description: "Stage and commit changes with a message.".to_string(),
            params: vec![
                ParamSpec::required("message", ParamKind::String, "The commit message"),
                ParamSpec::optional(
                    "files",
                    ParamKind::StringArray,
                    "Specific files to stage and commit. If empty, stages all changes.",
                ),
            ],
        }
    }

    async fn run(&self, ctx: &ToolContext, input: &Value) -> Result<String, ToolError> {
        let input: GitCommitInput = parse_input(input)?;
        if input.message.trim().is_empty() {
            return Err(ToolError::InvalidInput(
                "commit message must not be empty".to_string(),
            ));
        }

        if input.files.is_empty() {
            git(ctx, &["add", "-A"]).await?;
        } else {
            let files = relative_args(ctx, &input.files)?;
            let mut args = vec!["add", "--"];
            args.extend(files.iter().map(String::as_str));
            git(ctx, &args).await?;
        }

        git(ctx, &["commit", "-m", &input.message]).await
    }
}

/// `git push` of the current branch
pub struct GitPushTool;

#[async_trait]
impl Tool for GitPushTool {
    fn name(&self) -> &'static str {
        "git_push"
    }

    fn definition(&self, _ctx: &ToolContext) -> ToolDefinition {
        ToolDefinition {
            name: self.name(),
            description: "Push committed changes to the remote repository.".to_string(),
            params: vec![],
        }
    }

    async fn run(&self, ctx: &ToolContext, _input: &Value) -> Result<String, ToolError> {
        let output = run_checked("git", &["push"], ctx.root.path()).await?;

        // git reports push progress on stderr
        if !output.stdout.trim().is_empty() {
            Ok(output.stdout)
        } else if !output.stderr.trim().is_empty() {
            Ok(output.stderr)
        } else {
            Ok("Pushed successfully".to_string())
        }
    }
}
