#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use pagepilot_db::MemoryStore;
use serde_json::Value;
use tower::ServiceExt;

use pagepilot_api::config::ServerConfig;
use pagepilot_api::router::build_app_router;
use pagepilot_api::state::AppState;

pub const TEST_API_KEY: &str = "test-dashboard-key";
pub const TEST_VERIFY_TOKEN: &str = "test-verify-token";

/// Build a test `ServerConfig` with safe defaults and no app secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        verify_token: TEST_VERIFY_TOKEN.to_string(),
        app_secret: None,
        dashboard_api_key: TEST_API_KEY.to_string(),
    }
}

/// Build the full application router over `store` with the given config.
pub fn build_app_with(store: Arc<MemoryStore>, config: ServerConfig) -> Router {
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
        graph: None,
    };
    build_app_router(state, &config)
}

/// Build the full application router over `store` with [`test_config`].
pub fn build_test_app(store: Arc<MemoryStore>) -> Router {
    build_app_with(store, test_config())
}

/// Send a GET request with the dashboard API key.
pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

/// Send a request with the dashboard API key and an optional JSON body.
pub async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-api-key", TEST_API_KEY);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect a response body as text.
pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
