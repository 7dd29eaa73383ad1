/// Graph API configuration.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Versioned API base, without trailing slash.
    pub graph_url: String,
    /// Page access token. Sending and lead lookups are disabled without it.
    pub page_access_token: Option<String>,
    pub timeout_secs: u64,
}

impl GraphConfig {
    /// Load from environment variables.
    ///
    /// | Env var                | Default                              |
    /// |------------------------|--------------------------------------|
    /// | `FB_GRAPH_URL`         | `https://graph.facebook.com/v19.0`   |
    /// | `FB_PAGE_ACCESS_TOKEN` | unset                                |
    /// | `FB_TIMEOUT_SECS`      | `30`                                 |
    pub fn from_env() -> Self {
        let graph_url = std::env::var("FB_GRAPH_URL")
            .unwrap_or_else(|_| "https://graph.facebook.com/v19.0".into())
            .trim_end_matches('/')
            .to_string();

        let page_access_token = std::env::var("FB_PAGE_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());

        let timeout_secs: u64 = std::env::var("FB_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("FB_TIMEOUT_SECS must be a valid u64");

        Self {
            graph_url,
            page_access_token,
            timeout_secs,
        }
    }
}
