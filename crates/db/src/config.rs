/// Connection settings for a Parse-compatible REST backend.
#[derive(Debug, Clone)]
pub struct ParseConfig {
    /// Base URL including the mount path, e.g. `https://parseapi.back4app.com`.
    pub server_url: String,
    pub app_id: String,
    pub rest_key: String,
    /// Required for schema management only.
    pub master_key: Option<String>,
    /// Per-request timeout in seconds (default: `30`).
    pub timeout_secs: u64,
}

impl ParseConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` when `PARSE_APP_ID` is unset.
    ///
    /// | Env Var              | Default                          |
    /// |----------------------|----------------------------------|
    /// | `PARSE_SERVER_URL`   | `https://parseapi.back4app.com`  |
    /// | `PARSE_APP_ID`       | (required)                       |
    /// | `PARSE_REST_KEY`     | empty                            |
    /// | `PARSE_MASTER_KEY`   | unset                            |
    /// | `PARSE_TIMEOUT_SECS` | `30`                             |
    pub fn from_env() -> Option<Self> {
        let app_id = std::env::var("PARSE_APP_ID").ok().filter(|v| !v.is_empty())?;

        let server_url = std::env::var("PARSE_SERVER_URL")
            .unwrap_or_else(|_| "https://parseapi.back4app.com".into())
            .trim_end_matches('/')
            .to_string();

        let rest_key = std::env::var("PARSE_REST_KEY").unwrap_or_default();
        let master_key = std::env::var("PARSE_MASTER_KEY")
            .ok()
            .filter(|v| !v.is_empty());

        let timeout_secs = std::env::var("PARSE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Some(Self {
            server_url,
            app_id,
            rest_key,
            master_key,
            timeout_secs,
        })
    }
}
