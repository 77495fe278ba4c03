//! System prompt for the development assistant

use crate::tools::ToolContext;

const ASSISTANT_PROMPT: &str = r#"You are a development assistant with access to a local repository checkout. You can help with:

- Reading and understanding code
- Making edits to files
- Searching for patterns across the codebase
- Git operations (status, diff, commit, push)
- Running builds

All paths are relative to the repository root. Paths outside the repository are rejected.

When making changes:
1. Always read the file first to understand context
2. Make targeted edits
3. Run a build to verify changes work
4. Commit with clear messages

Be concise but thorough. When showing code, show relevant snippets, not entire files."#;

/// Build the system prompt, listing the projects `run_build` knows about
pub fn build_system_prompt(ctx: &ToolContext) -> String {
    let mut prompt = ASSISTANT_PROMPT.to_string();

    if !ctx.build.projects.is_empty() {
        prompt.push_str("\n\nBuildable projects:\n");
        for (name, project) in &ctx.build.projects {
            prompt.push_str(&format!(
                "- {} (in {}): {}\n",
                name,
                project.path.display(),
                project.command.join(" ")
            ));
        }
    }

    prompt
}
