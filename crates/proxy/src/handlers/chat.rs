//! Chat relay for the dashboard assistant.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::llm::ChatMessage;
use crate::middleware::auth::ApiKey;
use crate::state::ProxyState;

const CHAT_SYSTEM_PROMPT: &str = "You are PagePilot, a marketing assistant for a small business that sells through its Facebook page. \
Answer concisely and practically. Suggest replies, promos and follow-ups the owner can use right away.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Free-form description of the business: a string or any JSON value.
    #[serde(default)]
    pub business_context: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

fn system_prompt(context: Option<&Value>) -> String {
    let rendered = match context {
        None | Some(Value::Null) => return CHAT_SYSTEM_PROMPT.to_string(),
        Some(Value::String(text)) if text.trim().is_empty() => {
            return CHAT_SYSTEM_PROMPT.to_string()
        }
        Some(Value::String(text)) => text.clone(),
        Some(other) => serde_json::to_string_pretty(other).unwrap_or_default(),
    };
    format!("{CHAT_SYSTEM_PROMPT}\n\nBusiness context:\n{rendered}")
}

/// POST /chat
pub async fn chat(
    _key: ApiKey,
    State(state): State<ProxyState>,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    if request.messages.is_empty() {
        return Err(AppError::BadRequest("messages must not be empty".into()));
    }
    let system = system_prompt(request.business_context.as_ref());
    let response = state.model.complete(Some(&system), &request.messages).await?;
    Ok(Json(ChatResponse { response }))
}
