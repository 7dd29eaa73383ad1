//! Webhook audit log statuses.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookStatus {
    Received,
    Processed,
    Error,
}

impl WebhookStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Processed => "processed",
            Self::Error => "error",
        }
    }
}
