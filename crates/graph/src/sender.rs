//! The outbound-message seam.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::GraphError;

/// Anything that can deliver a text to a page-scoped user id.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_text(&self, psid: &str, text: &str) -> Result<(), GraphError>;
}

/// A sender that records messages instead of delivering them.
///
/// Used when no page token is configured (messages are logged and
/// dropped) and by tests. Recipients in `failing` get an API error.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(String, String)>>,
    failing: HashSet<String>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender that fails for the given recipients.
    pub fn failing_for<I, S>(psids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sent: Mutex::default(),
            failing: psids.into_iter().map(Into::into).collect(),
        }
    }

    /// Every `(psid, text)` delivered so far, in order.
    pub async fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_text(&self, psid: &str, text: &str) -> Result<(), GraphError> {
        if self.failing.contains(psid) {
            return Err(GraphError::Api {
                status: 400,
                message: format!("recipient {psid} unavailable"),
            });
        }
        tracing::info!(psid, "Message recorded (not delivered)");
        self.sent.lock().await.push((psid.to_string(), text.to_string()));
        Ok(())
    }
}
