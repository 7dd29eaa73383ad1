/// Errors raised by datastore access.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The datastore answered with a non-2xx status.
    #[error("Datastore error ({status}): {message}")]
    Api {
        status: u16,
        /// Parse error code, when the body carried one.
        code: Option<i64>,
        message: String,
    },

    /// A response or stored row did not have the expected shape.
    #[error("Unexpected datastore payload: {0}")]
    Decode(String),

    /// The query could not be expressed.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// An operation exceeded its deadline.
    #[error("Datastore operation timed out after {0}s")]
    Timeout(u64),

    /// A domain rule rejected the write.
    #[error(transparent)]
    Core(#[from] pagepilot_core::error::CoreError),
}

impl DbError {
    /// Whether the error means the object does not exist.
    ///
    /// Parse reports missing objects as code 101.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. } | Self::Api { code: Some(101), .. })
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
