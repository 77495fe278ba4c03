//! Tool registry
//!
//! Nine fixed tools the model may call: file listing, reading, writing and
//! searching, four git operations, and a project build. Every tool turns its
//! outcome into text; [`ToolRegistry::execute`] never fails.

mod build;
mod fs;
mod git;
mod process;
mod repo_root;
mod search;

pub use build::RunBuildTool;
pub use fs::{ListFilesTool, ReadFileTool, WriteFileTool};
pub use git::{GitCommitTool, GitDiffTool, GitPushTool, GitStatusTool};
pub use repo_root::RepoRoot;
pub use search::{SearchFilesTool, MAX_SEARCH_RESULTS};

use crate::config::BuildConfig;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Failure inside a single tool
///
/// Only ever seen by the registry, which renders it to text for the model.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Path is outside the repository: {0}")]
    PathEscape(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Command failed: {command}\n{message}")]
    Command { command: String, message: String },

    #[error("Invalid pattern: {0}")]
    Pattern(String),

    #[error("Unknown project: {0}")]
    UnknownProject(String),
}

/// Shape of a single tool parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    String,
    StringArray,
    /// A string restricted to the listed values
    Enum(Vec<String>),
}

/// One entry of a tool's input schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
}

impl ParamSpec {
    pub fn required(name: &'static str, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name,
            kind,
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(name: &'static str, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name,
            kind,
            description: description.into(),
            required: false,
        }
    }

    fn schema(&self) -> Value {
        let mut schema = match &self.kind {
            ParamKind::String => json!({ "type": "string" }),
            ParamKind::StringArray => json!({ "type": "array", "items": { "type": "string" } }),
            ParamKind::Enum(values) => json!({ "type": "string", "enum": values }),
        };
        schema["description"] = Value::String(self.description.clone());
        schema
    }
}

/// A tool as advertised to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolDefinition {
    /// Names of the parameters the tool cannot run without
    pub fn required_params(&self) -> Vec<&'static str> {
        self.params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect()
    }

    /// JSON schema object for the `input_schema` field
    pub fn input_schema(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.to_string(), p.schema()))
            .collect();

        let mut schema = json!({
            "type": "object",
            "properties": properties,
        });

        let required = self.required_params();
        if !required.is_empty() {
            schema["required"] = json!(required);
        }

        schema
    }
}

impl Serialize for ToolDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ToolDefinition", 3)?;
        state.serialize_field("name", self.name)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("input_schema", &self.input_schema())?;
        state.end()
    }
}

/// Everything a tool may touch, fixed at startup
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub root: RepoRoot,
    pub build: BuildConfig,
}

/// A single model-callable operation
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name
    fn name(&self) -> &'static str;

    /// Definition sent to the model
    fn definition(&self, ctx: &ToolContext) -> ToolDefinition;

    /// Prefix for failure text handed back to the model
    fn error_prefix(&self) -> &'static str {
        "Error"
    }

    /// Run the tool
    async fn run(&self, ctx: &ToolContext, input: &Value) -> Result<String, ToolError>;
}

/// Deserialize tool input, treating a missing input as an empty object
pub(crate) fn parse_input<T: DeserializeOwned>(input: &Value) -> Result<T, ToolError> {
    let input = if input.is_null() { json!({}) } else { input.clone() };
    serde_json::from_value(input).map_err(|e| ToolError::InvalidInput(e.to_string()))
}

/// Text handed back to the model for one tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

/// The fixed set of tools, plus the context they run in
pub struct ToolRegistry {
    ctx: ToolContext,
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry with all nine tools
    pub fn new(ctx: ToolContext) -> Self {
        let tools: Vec<Box<dyn Tool>> = vec![
            Box::new(ListFilesTool),
            Box::new(ReadFileTool),
            Box::new(WriteFileTool),
            Box::new(SearchFilesTool),
            Box::new(GitStatusTool),
            Box::new(GitDiffTool),
            Box::new(GitCommitTool),
            Box::new(GitPushTool),
            Box::new(RunBuildTool),
        ];

        Self { ctx, tools }
    }

    /// Context the tools run in
    pub fn context(&self) -> &ToolContext {
        &self.ctx
    }

    /// Definitions for every registered tool, in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition(&self.ctx)).collect()
    }

    /// Registered tool names
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Run a tool by name; failures come back as text
    pub async fn execute(&self, name: &str, input: &Value) -> ToolOutput {
        let Some(tool) = self.get(name) else {
            warn!(tool = name, "Model requested an unknown tool");
            return ToolOutput {
                content: format!("Unknown tool: {}", name),
                is_error: true,
            };
        };

        match tool.run(&self.ctx, input).await {
            Ok(content) => {
                debug!(tool = name, bytes = content.len(), "Tool finished");
                ToolOutput {
                    content,
                    is_error: false,
                }
            }
            Err(e) => {
                warn!(tool = name, error = %e, "Tool failed");
                ToolOutput {
                    content: format!("{}: {}", tool.error_prefix(), e),
                    is_error: true,
                }
            }
        }
    }
}
