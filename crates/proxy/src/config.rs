use std::path::PathBuf;

/// Proxy configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    /// Key expected in `X-API-Key`. Empty allows loopback callers only.
    pub api_key: String,
    pub cors_origins: Vec<String>,
    /// Outer HTTP timeout. Must exceed the build timeout.
    pub request_timeout_secs: u64,
    /// OAuth credentials file (`accessToken`, `refreshToken`, `expiresAt`).
    pub credentials_path: PathBuf,
    pub oauth_token_url: String,
    pub oauth_client_id: Option<String>,
    pub llm_api_url: String,
    pub llm_model: String,
    pub llm_max_tokens: u32,
    /// Root of the dashboard project (contains `src/`).
    pub dashboard_dir: PathBuf,
    pub build_command: String,
    /// Deploy is skipped when unset.
    pub deploy_command: Option<String>,
}

impl ProxyConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                                         |
    /// |------------------------|-------------------------------------------------|
    /// | `PROXY_HOST`           | `127.0.0.1`                                     |
    /// | `PROXY_PORT`           | `3001`                                          |
    /// | `PROXY_API_KEY`        | empty                                           |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`                         |
    /// | `PROXY_TIMEOUT_SECS`   | `300`                                           |
    /// | `CREDENTIALS_PATH`     | `credentials.json`                              |
    /// | `OAUTH_TOKEN_URL`      | `https://console.anthropic.com/v1/oauth/token`  |
    /// | `OAUTH_CLIENT_ID`      | unset                                           |
    /// | `LLM_API_URL`          | `https://api.anthropic.com/v1`                  |
    /// | `LLM_MODEL`            | `claude-sonnet-4-20250514`                      |
    /// | `LLM_MAX_TOKENS`       | `8192`                                          |
    /// | `DASHBOARD_DIR`        | `../dashboard`                                  |
    /// | `BUILD_COMMAND`        | `npm run build`                                 |
    /// | `DEPLOY_COMMAND`       | unset                                           |
    pub fn from_env() -> Self {
        let host = std::env::var("PROXY_HOST").unwrap_or_else(|_| "127.0.0.1".into());

        let port: u16 = std::env::var("PROXY_PORT")
            .unwrap_or_else(|_| "3001".into())
            .parse()
            .expect("PROXY_PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("PROXY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("PROXY_TIMEOUT_SECS must be a valid u64");

        let llm_max_tokens: u32 = std::env::var("LLM_MAX_TOKENS")
            .unwrap_or_else(|_| "8192".into())
            .parse()
            .expect("LLM_MAX_TOKENS must be a valid u32");

        Self {
            host,
            port,
            api_key: std::env::var("PROXY_API_KEY").unwrap_or_default(),
            cors_origins,
            request_timeout_secs,
            credentials_path: std::env::var("CREDENTIALS_PATH")
                .unwrap_or_else(|_| "credentials.json".into())
                .into(),
            oauth_token_url: std::env::var("OAUTH_TOKEN_URL")
                .unwrap_or_else(|_| "https://console.anthropic.com/v1/oauth/token".into()),
            oauth_client_id: non_empty_var("OAUTH_CLIENT_ID"),
            llm_api_url: std::env::var("LLM_API_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com/v1".into()),
            llm_model: std::env::var("LLM_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".into()),
            llm_max_tokens,
            dashboard_dir: std::env::var("DASHBOARD_DIR")
                .unwrap_or_else(|_| "../dashboard".into())
                .into(),
            build_command: std::env::var("BUILD_COMMAND")
                .unwrap_or_else(|_| "npm run build".into()),
            deploy_command: non_empty_var("DEPLOY_COMMAND"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}
