//! Devassist Server Library
//!
//! Provides the HTTP interface to the development assistant.

pub mod routes;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use devassist_core::DevAssistConfig;
use std::net::SocketAddr;
use std::sync::Once;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use state::AppState;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing subscriber (only once)
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new(
                std::env::var("RUST_LOG").unwrap_or_else(|_| {
                    "devassist_server=debug,devassist_core=info,tower_http=debug".into()
                }),
            ))
            .with(tracing_subscriber::fmt::layer())
            .init();
    });
}

/// Build the Axum router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health_check))
        // Assistant routes
        .route("/dev/api/chat", post(routes::chat))
        .route("/dev/api/tools", get(routes::list_tools))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the devassist server with the given configuration
pub async fn run_server(config: DevAssistConfig) -> anyhow::Result<()> {
    // Initialize tracing (if not already done)
    init_tracing();

    tracing::info!("Starting devassist server...");

    let state = AppState::from_config(&config)?;
    if state.auth_token.is_none() {
        tracing::warn!("No auth token configured, assistant routes are open");
    }

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on http://{}", addr);
    tracing::info!(model = %config.llm.model, "Chat endpoint: POST http://{}/dev/api/chat", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use devassist_core::config::BuildConfig;
    use devassist_core::llm::{
        ContentBlock, LlmError, Message, MessageRequest, MessageResponse, ModelClient, StopReason,
    };
    use devassist_core::{Orchestrator, OrchestratorSettings, RepoRoot, ToolContext, ToolRegistry};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    /// Asks for `list_files` once, then answers with the tool output it got
    struct EchoClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModelClient for EchoClient {
        async fn create_message(
            &self,
            request: &MessageRequest,
        ) -> Result<MessageResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let last = request.messages.last().map(|m| m.content.blocks().to_vec());
            let results: Vec<String> = last
                .unwrap_or_default()
                .into_iter()
                .filter_map(|b| match b {
                    ContentBlock::ToolResult { content, .. } => Some(content),
                    _ => None,
                })
                .collect();

            if !results.is_empty() {
                return Ok(MessageResponse::final_text(results.join("\n")));
            }

            Ok(MessageResponse {
                id: "msg_1".to_string(),
                content: vec![ContentBlock::ToolUse {
                    id: "toolu_1".to_string(),
                    name: "list_files".to_string(),
                    input: json!({"path": "."}),
                }],
                stop_reason: Some(StopReason::ToolUse),
            })
        }
    }

    /// Always fails upstream
    struct DownClient;

    #[async_trait]
    impl ModelClient for DownClient {
        async fn create_message(
            &self,
            _request: &MessageRequest,
        ) -> Result<MessageResponse, LlmError> {
            Err(LlmError::Connection("connection refused".to_string()))
        }
    }

    fn app_with(
        client: Arc<dyn ModelClient>,
        token: Option<&str>,
    ) -> (Router, TempDir) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("app")).unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();

        let ctx = ToolContext {
            root: RepoRoot::new(dir.path()).unwrap(),
            build: BuildConfig::default(),
        };
        let orchestrator = Orchestrator::new(
            client,
            Arc::new(ToolRegistry::new(ctx)),
            OrchestratorSettings::default(),
        );
        let state = AppState::new(orchestrator, token.map(String::from));
        (build_router(state), dir)
    }

    fn chat_request(body: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/dev/api/chat")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_chat_runs_tools() {
        let client = Arc::new(EchoClient {
            calls: AtomicUsize::new(0),
        });
        let (app, _dir) = app_with(client.clone(), Some("secret"));

        let body = json!({"messages": [{"role": "user", "content": "list files in root"}]});
        let response = app
            .oneshot(chat_request(&body.to_string(), Some("Bearer secret")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["toolsUsed"], json!(["list_files"]));
        assert_eq!(json["response"], json!("📁 app\n📄 package.json"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_chat_accepts_multi_turn_history() {
        let client = Arc::new(EchoClient {
            calls: AtomicUsize::new(0),
        });
        let (app, _dir) = app_with(client, None);

        let history = vec![
            Message::user("hi"),
            Message::assistant("Hello, what should I look at?"),
            Message::user("the root"),
        ];
        let body = json!({ "messages": history });
        let response = app
            .oneshot(chat_request(&body.to_string(), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized_without_model_call() {
        let client = Arc::new(EchoClient {
            calls: AtomicUsize::new(0),
        });
        let (app, _dir) = app_with(client.clone(), Some("secret"));

        let body = json!({"messages": [{"role": "user", "content": "hi"}]}).to_string();
        let response = app
            .clone()
            .oneshot(chat_request(&body, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await, json!({"error": "Unauthorized"}));

        let response = app
            .oneshot(chat_request(&body, Some("Bearer wrong")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_body_is_server_error() {
        let (app, _dir) = app_with(Arc::new(DownClient), None);

        let response = app
            .clone()
            .oneshot(chat_request("{not json", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json_body(response).await["error"].is_string());

        let response = app
            .oneshot(chat_request(r#"{"history": []}"#, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_empty_messages_is_server_error() {
        let (app, _dir) = app_with(Arc::new(DownClient), None);
        let response = app
            .oneshot(chat_request(r#"{"messages": []}"#, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_server_error() {
        let (app, _dir) = app_with(Arc::new(DownClient), None);
        let body = json!({"messages": [{"role": "user", "content": "hi"}]}).to_string();

        let response = app.oneshot(chat_request(&body, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error = json_body(response).await["error"].as_str().unwrap().to_string();
        assert!(error.contains("connection refused"), "{}", error);
    }

    #[tokio::test]
    async fn test_tools_route_lists_definitions() {
        let (app, _dir) = app_with(Arc::new(DownClient), Some("secret"));

        let request = Request::builder()
            .uri("/dev/api/tools")
            .header(header::AUTHORIZATION, "Bearer secret")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        let tools = json["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 9);
        assert_eq!(tools[0]["name"], json!("list_files"));
        assert!(tools[0]["input_schema"].is_object());

        let request = Request::builder()
            .uri("/dev/api/tools")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_health_is_open() {
        let (app, _dir) = app_with(Arc::new(DownClient), Some("secret"));
        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], json!("ok"));
    }
}
