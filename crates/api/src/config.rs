/// Webhook server settings. Everything except `VERIFY_TOKEN` has a local
/// development default.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Static token Facebook echoes back during webhook verification.
    pub verify_token: String,
    /// App secret for `X-Hub-Signature-256` checks. Unset disables the check.
    pub app_secret: Option<String>,
    /// Key expected in `X-API-Key` on dashboard routes. Empty disables the
    /// dashboard API.
    pub dashboard_api_key: String,
}

impl ServerConfig {
    /// Read settings from the environment.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `VERIFY_TOKEN`         | required                   |
    /// | `FB_APP_SECRET`        | unset                      |
    /// | `DASHBOARD_API_KEY`    | empty                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let verify_token = std::env::var("VERIFY_TOKEN").expect("VERIFY_TOKEN must be set");

        let app_secret = std::env::var("FB_APP_SECRET").ok().filter(|s| !s.is_empty());

        let dashboard_api_key = std::env::var("DASHBOARD_API_KEY").unwrap_or_default();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            verify_token,
            app_secret,
            dashboard_api_key,
        }
    }
}
