//! Router for the AI proxy, shared by `main.rs` and the integration tests.

use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use pagepilot_core::security::API_KEY_HEADER;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ProxyConfig;
use crate::handlers::{agent, chat, health};
use crate::state::ProxyState;

/// Route hierarchy:
///
/// ```text
/// GET  /health            liveness (no auth)
/// POST /chat              chat relay
/// GET  /agent/source      registry and page files
/// POST /agent/generate    page plan from a prompt
/// POST /agent/apply       run the apply pipeline
/// POST /agent/schema      create a datastore class
/// GET  /agent/status      deploy lock and last apply
/// ```
pub fn build_app_router(state: ProxyState, config: &ProxyConfig) -> Router {
    let cors = build_cors_layer(config);
    let request_id_header = HeaderName::from_static("x-request-id");

    let agent_routes = Router::new()
        .route("/source", get(agent::source))
        .route("/generate", post(agent::generate))
        .route("/apply", post(agent::apply))
        .route("/schema", post(agent::create_schema))
        .route("/status", get(agent::status));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/chat", post(chat::chat))
        .nest("/agent", agent_routes)
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// Build the CORS layer. Panics at startup on an invalid origin.
pub fn build_cors_layer(config: &ProxyConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)])
        .max_age(Duration::from_secs(3600))
}
