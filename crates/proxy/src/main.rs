use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pagepilot_proxy::agent::lock::DeployLock;
use pagepilot_proxy::agent::pipeline::Pipeline;
use pagepilot_proxy::agent::workspace::DashboardDir;
use pagepilot_proxy::config::ProxyConfig;
use pagepilot_proxy::llm::AnthropicClient;
use pagepilot_proxy::router::build_app_router;
use pagepilot_proxy::state::ProxyState;
use pagepilot_proxy::token::{CredentialsFile, TokenManager};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagepilot_proxy=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ProxyConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        dashboard_dir = %config.dashboard_dir.display(),
        "Loaded proxy configuration"
    );
    if config.api_key.is_empty() {
        tracing::warn!("PROXY_API_KEY not set, only loopback callers are accepted");
    }

    // --- Datastore ---
    let store = pagepilot_db::store_from_env().expect("Failed to configure datastore");

    // --- LLM ---
    let tokens = Arc::new(
        TokenManager::new(
            CredentialsFile::new(&config.credentials_path),
            config.oauth_token_url.clone(),
            config.oauth_client_id.clone(),
        )
        .expect("Failed to build OAuth client"),
    );
    let model = AnthropicClient::new(
        config.llm_api_url.clone(),
        config.llm_model.clone(),
        config.llm_max_tokens,
        tokens,
    )
    .expect("Failed to build LLM client");

    // --- Pipeline ---
    let pipeline = Pipeline::new(
        DashboardDir::new(&config.dashboard_dir),
        Arc::clone(&store),
        config.build_command.clone(),
        config.deploy_command.clone(),
    );

    let state = ProxyState {
        config: Arc::new(config.clone()),
        store,
        model: Arc::new(model),
        pipeline: Arc::new(pipeline),
        deploy_lock: DeployLock::new(),
        last_apply: Arc::new(RwLock::new(None)),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid PROXY_HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting proxy");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    tracing::info!("Graceful shutdown complete");
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
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
