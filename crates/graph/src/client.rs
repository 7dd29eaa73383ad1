//! REST client for the Graph API endpoints PagePilot uses.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::GraphConfig;
use crate::error::GraphError;
use crate::sender::MessageSender;

/// HTTP client for one Facebook page.
pub struct GraphClient {
    client: reqwest::Client,
    graph_url: String,
    page_access_token: String,
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient")
            .field("graph_url", &self.graph_url)
            .field("page_access_token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Response of `POST /me/messages`.
#[derive(Debug, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
}

/// One answered question of a lead form.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LeadFieldData {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// A lead-ad submission as returned by `GET /{leadgen_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct LeadgenData {
    pub id: String,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub field_data: Vec<LeadFieldData>,
}

impl LeadgenData {
    /// First answer to the question named `name` (case-insensitive).
    pub fn field(&self, name: &str) -> Option<&str> {
        self.field_data
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .and_then(|f| f.values.first())
            .map(String::as_str)
    }

    /// Full name, assembled from first/last name questions when the form
    /// does not ask for it directly.
    pub fn full_name(&self) -> Option<String> {
        if let Some(name) = self.field("full_name") {
            return Some(name.to_string());
        }
        let parts: Vec<&str> = [self.field("first_name"), self.field("last_name")]
            .into_iter()
            .flatten()
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    pub fn email(&self) -> Option<&str> {
        self.field("email")
    }

    pub fn phone(&self) -> Option<&str> {
        self.field("phone_number").or_else(|| self.field("phone"))
    }
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    error: GraphErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GraphErrorDetail {
    message: String,
}

impl GraphClient {
    /// Build a client. Fails with [`GraphError::NotConfigured`] when no page
    /// token is set.
    pub fn new(config: &GraphConfig) -> Result<Self, GraphError> {
        let token = config
            .page_access_token
            .clone()
            .ok_or(GraphError::NotConfigured)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            graph_url: config.graph_url.clone(),
            page_access_token: token,
        })
    }

    /// Send a plain text message to a page-scoped user id.
    pub async fn send_text_message(
        &self,
        psid: &str,
        text: &str,
    ) -> Result<SendResponse, GraphError> {
        let body = json!({
            "recipient": { "id": psid },
            "messaging_type": "MESSAGE_TAG",
            "tag": "ACCOUNT_UPDATE",
            "message": { "text": text },
        });
        let response = self
            .client
            .post(format!("{}/me/messages", self.graph_url))
            .query(&[("access_token", &self.page_access_token)])
            .json(&body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Fetch the answers of a lead-ad submission.
    pub async fn fetch_lead(&self, leadgen_id: &str) -> Result<LeadgenData, GraphError> {
        let response = self
            .client
            .get(format!("{}/{}", self.graph_url, leadgen_id))
            .query(&[
                ("access_token", self.page_access_token.as_str()),
                ("fields", "id,created_time,field_data"),
            ])
            .send()
            .await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GraphError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            let message = serde_json::from_str::<GraphErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(GraphError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GraphError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl MessageSender for GraphClient {
    async fn send_text(&self, psid: &str, text: &str) -> Result<(), GraphError> {
        let sent = self.send_text_message(psid, text).await?;
        tracing::debug!(psid, message_id = ?sent.message_id, "Messenger text sent");
        Ok(())
    }
}
