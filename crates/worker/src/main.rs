use std::sync::Arc;
use std::time::Duration;

use pagepilot_graph::{GraphClient, GraphConfig, MessageSender, RecordingSender};
use pagepilot_jobs::{runner, JobContext, JobsConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagepilot_worker=debug,pagepilot_jobs=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = JobsConfig::from_env();
    tracing::info!(
        admins = config.admin_psids.len(),
        sla_minutes = config.sla_minutes,
        reengage_after_days = config.reengage_after_days,
        "Loaded job configuration"
    );

    // --- Datastore ---
    let store = pagepilot_db::store_from_env().expect("Failed to build datastore client");

    // --- Messenger ---
    let graph_config = GraphConfig::from_env();
    let sender: Arc<dyn MessageSender> = match GraphClient::new(&graph_config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::warn!(error = %e, "Messages will be logged, not delivered");
            Arc::new(RecordingSender::new())
        }
    };

    let ctx = Arc::new(JobContext {
        store,
        sender,
        config,
    });

    // --- Runner ---
    let cancel = CancellationToken::new();
    let jobs = runner::default_jobs(&ctx);
    let runner_handle = tokio::spawn(runner::run(Arc::clone(&ctx), jobs, cancel.clone()));
    tracing::info!("Job runner started");

    shutdown_signal().await;

    cancel.cancel();
    if tokio::time::timeout(Duration::from_secs(30), runner_handle)
        .await
        .is_err()
    {
        tracing::warn!("Job runner did not stop within 30s");
    }
    tracing::info!("Worker shut down");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), stopping jobs");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, stopping jobs");
        }
    }
}
