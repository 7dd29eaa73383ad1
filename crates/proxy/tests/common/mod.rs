#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use pagepilot_db::MemoryStore;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tower::ServiceExt;

use pagepilot_proxy::agent::lock::DeployLock;
use pagepilot_proxy::agent::pipeline::Pipeline;
use pagepilot_proxy::agent::workspace::DashboardDir;
use pagepilot_proxy::config::ProxyConfig;
use pagepilot_proxy::error::ProxyError;
use pagepilot_proxy::llm::{ChatMessage, ChatModel};
use pagepilot_proxy::router::build_app_router;
use pagepilot_proxy::state::ProxyState;

pub const TEST_API_KEY: &str = "test-proxy-key";

/// Model that answers every call with a fixed reply and records prompts.
pub struct StubModel {
    pub reply: String,
    pub calls: Mutex<Vec<(Option<String>, Vec<ChatMessage>)>>,
}

impl StubModel {
    pub fn new(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.into(),
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChatModel for StubModel {
    async fn complete(
        &self,
        system: Option<&str>,
        messages: &[ChatMessage],
    ) -> Result<String, ProxyError> {
        self.calls
            .lock()
            .await
            .push((system.map(String::from), messages.to_vec()));
        Ok(self.reply.clone())
    }
}

pub fn test_config(dashboard_dir: &Path, build_command: &str) -> ProxyConfig {
    ProxyConfig {
        host: "127.0.0.1".into(),
        port: 0,
        api_key: TEST_API_KEY.into(),
        cors_origins: vec!["http://localhost:5173".into()],
        request_timeout_secs: 30,
        credentials_path: dashboard_dir.join("credentials.json"),
        oauth_token_url: "http://127.0.0.1:9/token".into(),
        oauth_client_id: None,
        llm_api_url: "http://127.0.0.1:9".into(),
        llm_model: "test-model".into(),
        llm_max_tokens: 100,
        dashboard_dir: dashboard_dir.to_path_buf(),
        build_command: build_command.into(),
        deploy_command: None,
    }
}

/// Build the proxy router over a temp dashboard directory.
pub fn build_test_app(
    dashboard_dir: &Path,
    build_command: &str,
    model: Arc<StubModel>,
    store: Arc<MemoryStore>,
) -> Router {
    let config = test_config(dashboard_dir, build_command);
    let pipeline = Pipeline::new(
        DashboardDir::new(dashboard_dir),
        store.clone(),
        build_command,
        None,
    );
    let state = ProxyState {
        config: Arc::new(config.clone()),
        store,
        model,
        pipeline: Arc::new(pipeline),
        deploy_lock: DeployLock::new(),
        last_apply: Arc::new(RwLock::new(None)),
    };
    build_app_router(state, &config)
}

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

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
