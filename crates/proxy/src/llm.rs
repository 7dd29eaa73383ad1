//! LLM chat client.
//!
//! [`ChatModel`] is the seam the handlers talk to; [`AnthropicClient`] calls
//! the Messages API with the OAuth bearer token from [`TokenManager`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ProxyError;
use crate::token::TokenManager;

const API_VERSION: &str = "2023-06-01";

/// Generation can take a while for whole pages.
const HTTP_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete a conversation, returning the assistant's text.
    async fn complete(
        &self,
        system: Option<&str>,
        messages: &[ChatMessage],
    ) -> Result<String, ProxyError>;
}

pub struct AnthropicClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    tokens: Arc<TokenManager>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        tokens: Arc<TokenManager>,
    ) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            max_tokens,
            tokens,
        })
    }
}

#[async_trait]
impl ChatModel for AnthropicClient {
    async fn complete(
        &self,
        system: Option<&str>,
        messages: &[ChatMessage],
    ) -> Result<String, ProxyError> {
        let token = self.tokens.access_token().await?;

        let mut body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": messages,
        });
        if let Some(system) = system {
            body["system"] = json!(system);
        }

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .bearer_auth(token)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                // Re-read the credentials file on the next call.
                self.tokens.invalidate().await;
            }
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProxyError::Llm {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = response.json().await?;
        let text: String = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        tracing::debug!(model = %self.model, chars = text.len(), "LLM completion received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;
    use mockito::Matcher;

    use super::*;
    use crate::token::{Credentials, CredentialsFile};

    async fn token_manager(dir: &tempfile::TempDir) -> Arc<TokenManager> {
        let file = CredentialsFile::new(dir.path().join("credentials.json"));
        file.save(&Credentials {
            access_token: "tok-1".into(),
            refresh_token: "ref-1".into(),
            expires_at: Utc::now().timestamp_millis() + 3_600_000,
        })
        .await
        .unwrap();
        Arc::new(TokenManager::new(file, "http://127.0.0.1:9/token", None).unwrap())
    }

    #[tokio::test]
    async fn complete_sends_bearer_and_joins_text_blocks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/messages")
            .match_header("authorization", "Bearer tok-1")
            .match_header("anthropic-version", API_VERSION)
            .match_body(Matcher::PartialJson(json!({
                "model": "test-model",
                "system": "be brief",
                "messages": [{"role": "user", "content": "hi"}],
            })))
            .with_status(200)
            .with_body(
                r#"{"content":[{"type":"text","text":"Hello"},{"type":"text","text":" there"}]}"#,
            )
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client =
            AnthropicClient::new(server.url(), "test-model", 100, token_manager(&dir).await)
                .unwrap();
        let text = client
            .complete(Some("be brief"), &[ChatMessage::user("hi")])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(text, "Hello there");
    }

    #[tokio::test]
    async fn api_error_carries_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/messages")
            .with_status(529)
            .with_body(r#"{"type":"error","error":{"type":"overloaded_error"}}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client =
            AnthropicClient::new(server.url(), "m", 100, token_manager(&dir).await).unwrap();
        let result = client.complete(None, &[ChatMessage::user("hi")]).await;

        assert_matches!(result, Err(ProxyError::Llm { status: 529, .. }));
    }
}
