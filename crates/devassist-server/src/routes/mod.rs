//! API route handlers

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use devassist_core::{DevAssistError, Message};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::AppState;

/// Failures surfaced by the assistant routes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    /// Body was not valid JSON or lacked `messages`
    #[error("Invalid request body: {0}")]
    Body(String),

    #[error(transparent)]
    Turn(#[from] DevAssistError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            // Everything but auth is reported as a server error
            ApiError::Body(_) | ApiError::Turn(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Dev API error");
        } else {
            tracing::warn!("Rejected unauthorized request");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

// ========== Assistant Routes ==========

#[derive(Deserialize)]
pub struct ChatRequest {
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    response: String,
    tools_used: Vec<String>,
}

/// Run one conversation turn
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    if !state.is_authorized(&headers) {
        return Err(ApiError::Unauthorized);
    }

    let request: ChatRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::Body(e.to_string()))?;

    let outcome = state
        .orchestrator
        .handle_conversation_turn(&request.messages)
        .await?;

    Ok(Json(ChatResponse {
        response: outcome.text,
        tools_used: outcome.tools_used,
    }))
}

/// Tool definitions exactly as sent to the model
pub async fn list_tools(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if !state.is_authorized(&headers) {
        return Err(ApiError::Unauthorized);
    }

    Ok(Json(serde_json::json!({
        "tools": state.orchestrator.tool_definitions()
    })))
}

// ========== Health ==========

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": devassist_core::version()
    }))
}
