//! Server state management

use axum::http::{header, HeaderMap};
use devassist_core::{
    AnthropicClient, DevAssistConfig, Orchestrator, OrchestratorSettings, RepoRoot, ToolContext,
    ToolRegistry,
};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Bearer token required on the assistant routes, if any
    pub auth_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, auth_token: Option<String>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            auth_token: auth_token.filter(|t| !t.is_empty()).map(Arc::from),
        }
    }

    /// Wire the production orchestrator from configuration
    pub fn from_config(config: &DevAssistConfig) -> devassist_core::Result<Self> {
        let root = RepoRoot::new(config.resolved_repo_path()?)?;
        tracing::info!(repo_root = %root.path().display(), "Repository root resolved");

        let ctx = ToolContext {
            root,
            build: config.build.clone(),
        };
        let client = AnthropicClient::from_config(&config.llm)?;
        let orchestrator = Orchestrator::new(
            Arc::new(client),
            Arc::new(ToolRegistry::new(ctx)),
            OrchestratorSettings::from_config(config),
        );

        Ok(Self::new(orchestrator, config.server.auth_token.clone()))
    }

    /// True when no token is configured or the request carries it
    pub fn is_authorized(&self, headers: &HeaderMap) -> bool {
        let Some(token) = self.auth_token.as_deref() else {
            return true;
        };

        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|presented| presented == token)
            .unwrap_or(false)
    }
}
