//! Standalone OAuth token refresher, meant for cron.
//!
//! Refreshes the credentials file when the token is within the refresh
//! buffer of expiry and exits non-zero on failure.

use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pagepilot_proxy::config::ProxyConfig;
use pagepilot_proxy::token::{CredentialsFile, RefreshOutcome, TokenManager};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagepilot_proxy=info,pagepilot_token_refresh=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ProxyConfig::from_env();
    let manager = match TokenManager::new(
        CredentialsFile::new(&config.credentials_path),
        config.oauth_token_url.clone(),
        config.oauth_client_id.clone(),
    ) {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build OAuth client");
            return ExitCode::FAILURE;
        }
    };

    match manager.refresh_if_needed().await {
        Ok(RefreshOutcome::Refreshed) => {
            tracing::info!(path = %config.credentials_path.display(), "Token refreshed");
            ExitCode::SUCCESS
        }
        Ok(RefreshOutcome::StillValid) => {
            tracing::info!("Token still valid, nothing to do");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Token refresh failed");
            ExitCode::FAILURE
        }
    }
}
