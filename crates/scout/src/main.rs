//! `pagepilot-scout [CONFIG]`: run the configured Places searches once and
//! save qualified listings as leads.
//!
//! The config path defaults to `$SCOUT_CONFIG`, then `scout.json`.

use std::path::PathBuf;
use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pagepilot_scout::{scout, PlacesClient, PlacesConfig, ScoutConfig};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagepilot_scout=info,pagepilot_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path: PathBuf = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SCOUT_CONFIG").ok())
        .unwrap_or_else(|| "scout.json".into())
        .into();

    let config = match ScoutConfig::load(&path).await {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load scout config");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        path = %path.display(),
        searches = config.searches.len(),
        min_reviews = config.criteria.min_reviews,
        "Loaded scout config"
    );

    let places = match PlacesClient::new(&PlacesConfig::from_env()) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Cannot search Places");
            return ExitCode::FAILURE;
        }
    };

    let store = match pagepilot_db::store_from_env() {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build datastore client");
            return ExitCode::FAILURE;
        }
    };

    match scout(store.as_ref(), &places, &config).await {
        Ok(report) => {
            tracing::info!(
                saved = report.saved,
                already_stored = report.already_stored,
                chains = report.chains,
                rejected = report.rejected,
                failed_searches = report.failed_searches,
                "Scouting complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Scouting run aborted");
            ExitCode::FAILURE
        }
    }
}
