/// Errors from the Graph API layer.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Graph returned a non-2xx status code.
    #[error("Graph API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// No page access token is configured.
    #[error("Graph API is not configured: FB_PAGE_ACCESS_TOKEN is unset")]
    NotConfigured,
}
