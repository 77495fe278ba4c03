//! File tools: list, read and write files under the repository root

use super::{parse_input, ParamKind, ParamSpec, Tool, ToolContext, ToolDefinition, ToolError};
use async_trait::async_trait;
use glob::Pattern;
use serde::Deserialize;
use serde_json::Value;

const DIR_MARKER: &str = "📁";
const FILE_MARKER: &str = "📄";

/// Lists the entries of one directory
pub struct ListFilesTool;

#[derive(Deserialize)]
struct ListFilesInput {
    path: String,
    #[serde(default)]
    pattern: Option<String>,
}

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &'static str {
        "list_files"
    }

    fn definition(&self, _ctx: &ToolContext) -> ToolDefinition {
        ToolDefinition {
            name: self.name(),
            description: "List files and directories at a given path. Returns file names with indicators for directories.".to_string(),
            params: vec![
                ParamSpec::required(
                    "path",
                    ParamKind::String,
                    "Relative path from repo root. Use '.' for root directory.",
                ),
                ParamSpec::optional(
                    "pattern",
                    ParamKind::String,
                    "Optional glob pattern to filter files (e.g., '*.jsx', '*.ts')",
                ),
            ],
        }
    }

    fn error_prefix(&self) -> &'static str {
        "Error listing files"
    }

    async fn run(&self, ctx: &ToolContext, input: &Value) -> Result<String, ToolError> {
        let input: ListFilesInput = parse_input(input)?;
        let target = ctx.root.resolve(&input.path)?;

        let pattern = input
            .pattern
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(Pattern::new)
            .transpose()
            .map_err(|e| ToolError::Pattern(e.to_string()))?;

        let mut entries = Vec::new();
        let mut read_dir = tokio::fs::read_dir(&target).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(ref pattern) = pattern {
                if !pattern.matches(&name) {
                    continue;
                }
            }
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            entries.push((name, is_dir));
        }

        if entries.is_empty() {
            return Ok("No entries found".to_string());
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(entries
            .iter()
            .map(|(name, is_dir)| {
                let marker = if *is_dir { DIR_MARKER } else { FILE_MARKER };
                format!("{} {}", marker, name)
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Returns the full text of a file
pub struct ReadFileTool;

#[derive(Deserialize)]
struct ReadFileInput {
    path: String,
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn definition(&self, _ctx: &ToolContext) -> ToolDefinition {
        ToolDefinition {
            name: self.name(),
            description: "Read the contents of a file. Returns the full file content.".to_string(),
            params: vec![ParamSpec::required(
                "path",
                ParamKind::String,
                "Relative path to the file from repo root",
            )],
        }
    }

    fn error_prefix(&self) -> &'static str {
        "Error reading file"
    }

    async fn run(&self, ctx: &ToolContext, input: &Value) -> Result<String, ToolError> {
        let input: ReadFileInput = parse_input(input)?;
        let target = ctx.root.resolve(&input.path)?;
        Ok(tokio::fs::read_to_string(&target).await?)
    }
}

/// Creates or overwrites a file, creating parent directories
pub struct WriteFileTool;

#[derive(Deserialize)]
struct WriteFileInput {
    path: String,
    content: String,
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn definition(&self, _ctx: &ToolContext) -> ToolDefinition {
        ToolDefinition {
            name: self.name(),
            description: "Write content to a file. Creates the file if it doesn't exist, overwrites if it does.".to_string(),
            params: vec![
                ParamSpec::required(
                    "path",
                    ParamKind::String,
                    "Relative path to the file from repo root",
                ),
                ParamSpec::required(
                    "content",
                    ParamKind::String,
                    "The content to write to the file",
                ),
            ],
        }
    }

    fn error_prefix(&self) -> &'static str {
        "Error writing file"
    }

    async fn run(&self, ctx: &ToolContext, input: &Value) -> Result<String, ToolError> {
        let input: WriteFileInput = parse_input(input)?;
        let target = ctx.root.resolve(&input.path)?;

        if target == ctx.root.path() {
            return Err(ToolError::InvalidInput(
                "path must name a file, not the repository root".to_string(),
            ));
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &input.content).await?;

        Ok(format!("Successfully wrote to {}", input.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use crate::tools::RepoRoot;
    use serde_json::json;
    use tempfile::TempDir;

    fn context() -> (ToolContext, TempDir) {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext {
            root: RepoRoot::new(dir.path()).unwrap(),
            build: BuildConfig::default(),
        };
        (ctx, dir)
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let (ctx, _dir) = context();
        let content = "export default function Page() {\n  return null;\n}\n";

        let written = WriteFileTool
            .run(&ctx, &json!({"path": "app/new/deep/page.jsx", "content": content}))
            .await
            .unwrap();
        assert_eq!(written, "Successfully wrote to app/new/deep/page.jsx");

        let read = ReadFileTool
            .run(&ctx, &json!({"path": "app/new/deep/page.jsx"}))
            .await
            .unwrap();
        assert_eq!(read, content);
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let (ctx, dir) = context();
        std::fs::write(dir.path().join("notes.txt"), "old").unwrap();

        WriteFileTool
            .run(&ctx, &json!({"path": "notes.txt", "content": "new"}))
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(dir.path().join("notes.txt")).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_write_outside_root_rejected() {
        let (ctx, _dir) = context();
        let err = WriteFileTool
            .run(&ctx, &json!({"path": "../escape.txt", "content": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::PathEscape(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_through_dangling_symlink_rejected() {
        let (ctx, dir) = context();
        let outside = TempDir::new().unwrap();
        let target = outside.path().join("pwned.txt");
        std::os::unix::fs::symlink(&target, dir.path().join("link.txt")).unwrap();

        let err = WriteFileTool
            .run(&ctx, &json!({"path": "link.txt", "content": "escaped"}))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::PathEscape(_)));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let (ctx, _dir) = context();
        let err = ReadFileTool
            .run(&ctx, &json!({"path": "missing.txt"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Io(_)));
    }

    #[tokio::test]
    async fn test_list_files_markers_and_order() {
        let (ctx, dir) = context();
        std::fs::create_dir(dir.path().join("app")).unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        std::fs::write(dir.path().join("README.md"), "# hi").unwrap();

        let listing = ListFilesTool.run(&ctx, &json!({"path": "."})).await.unwrap();
        assert_eq!(listing, "📄 README.md\n📁 app\n📄 package.json");
    }

    #[tokio::test]
    async fn test_list_files_pattern() {
        let (ctx, dir) = context();
        std::fs::write(dir.path().join("page.jsx"), "").unwrap();
        std::fs::write(dir.path().join("layout.jsx"), "").unwrap();
        std::fs::write(dir.path().join("route.js"), "").unwrap();

        let listing = ListFilesTool
            .run(&ctx, &json!({"path": ".", "pattern": "*.jsx"}))
            .await
            .unwrap();
        assert_eq!(listing, "📄 layout.jsx\n📄 page.jsx");
    }

    #[tokio::test]
    async fn test_list_files_empty_and_missing() {
        let (ctx, dir) = context();
        std::fs::create_dir(dir.path().join("empty")).unwrap();

        let listing = ListFilesTool.run(&ctx, &json!({"path": "empty"})).await.unwrap();
        assert_eq!(listing, "No entries found");

        let err = ListFilesTool
            .run(&ctx, &json!({"path": "nope"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Io(_)));
    }

    #[tokio::test]
    async fn test_list_files_bad_pattern() {
        let (ctx, _dir) = context();
        let err = ListFilesTool
            .run(&ctx, &json!({"path": ".", "pattern": "[z-a"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Pattern(_)));
    }
}
