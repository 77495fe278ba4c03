//! Recursive regex search over repository files

use super::{parse_input, ParamKind, ParamSpec, RepoRoot, Tool, ToolContext, ToolDefinition, ToolError};
use async_trait::async_trait;
use glob::Pattern;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Upper bound on matching lines returned to the model
pub const MAX_SEARCH_RESULTS: usize = 50;

const NO_MATCHES: &str = "No matches found";
const MAX_LINE_CHARS: usize = 500;
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules"];

/// Searches file contents with a regular expression
pub struct SearchFilesTool;

#[derive(Deserialize)]
struct SearchFilesInput {
    pattern: String,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    file_pattern: Option<String>,
}

#[async_trait]
impl Tool for SearchFilesTool {
    fn name(&self) -> &'static str {
        "search_files"
    }

    fn definition(&self, _ctx: &ToolContext) -> ToolDefinition {
        ToolDefinition {
            name: self.name(),
            description: format!(
                "Search for text patterns in files. Uses grep-like search and returns at most {} matching lines as path:line:text.",
                MAX_SEARCH_RESULTS
            ),
            params: vec![
                ParamSpec::required(
                    "pattern",
                    ParamKind::String,
                    "The text or regex pattern to search for",
                ),
                ParamSpec::optional(
                    "path",
                    ParamKind::String,
                    "Directory to search in (relative to repo root). Defaults to '.'",
                ),
                ParamSpec::optional(
                    "file_pattern",
                    ParamKind::String,
                    "File pattern to limit search (e.g., '*.jsx')",
                ),
            ],
        }
    }

    fn error_prefix(&self) -> &'static str {
        "Error searching"
    }

    async fn run(&self, ctx: &ToolContext, input: &Value) -> Result<String, ToolError> {
        let input: SearchFilesInput = parse_input(input)?;

        let regex = Regex::new(&input.pattern).map_err(|e| ToolError::Pattern(e.to_string()))?;
        let file_pattern = input
            .file_pattern
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(Pattern::new)
            .transpose()
            .map_err(|e| ToolError::Pattern(e.to_string()))?;

        let base = ctx.root.resolve(input.path.as_deref().unwrap_or("."))?;
        if !base.exists() {
            return Err(ToolError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("No such file or directory: {}", ctx.root.relative(&base).display()),
            )));
        }

        let root = ctx.root.clone();
        let matches = tokio::task::spawn_blocking(move || {
            search_tree(&root, &base, &regex, file_pattern.as_ref(), MAX_SEARCH_RESULTS)
        })
        .await
        .map_err(|e| ToolError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;

        if matches.is_empty() {
            Ok(NO_MATCHES.to_string())
        } else {
            Ok(matches.join("\n"))
        }
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| SKIPPED_DIRS.contains(&name))
            .unwrap_or(false)
}

/// Walk `base` collecting `path:line:text` entries, stopping at `limit`
fn search_tree(
    root: &RepoRoot,
    base: &Path,
    regex: &Regex,
    file_pattern: Option<&Pattern>,
    limit: usize,
) -> Vec<String> {
    let mut results = Vec::new();

    let walker = WalkDir::new(base)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e));

    for entry in walker.flatten() {
        if !entry.file_type().is_file() {
            continue;
        }

        if let Some(pattern) = file_pattern {
            let name = entry.file_name().to_string_lossy();
            if !pattern.matches(&name) {
                continue;
            }
        }

        let Some(text) = read_text(entry.path()) else {
            continue;
        };

        let display = root.relative(entry.path()).display().to_string();
        for (index, line) in text.lines().enumerate() {
            if !regex.is_match(line) {
                continue;
            }
            results.push(format!("{}:{}:{}", display, index + 1, truncate(line)));
            if results.len() >= limit {
                return results;
            }
        }
    }

    results
}

/// File content as text, or None for binary and non UTF-8 files
fn read_text(path: &Path) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    if bytes.iter().take(8192).any(|b| *b == 0) {
        return None;
    }
    String::from_utf8(bytes).ok()
}

fn truncate(line: &str) -> String {
    if line.chars().count() <= MAX_LINE_CHARS {
        line.to_string()
    } else {
        let cut: String = line.chars().take(MAX_LINE_CHARS).collect();
        format!("{}...", cut)
    }
}
