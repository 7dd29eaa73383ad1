use std::sync::Arc;

use pagepilot_db::DynStore;
use tokio::sync::RwLock;

use crate::agent::lock::DeployLock;
use crate::agent::pipeline::{ApplyReport, Pipeline};
use crate::config::ProxyConfig;
use crate::llm::ChatModel;

/// Shared proxy state, cheap to clone.
#[derive(Clone)]
pub struct ProxyState {
    pub config: Arc<ProxyConfig>,
    pub store: DynStore,
    pub model: Arc<dyn ChatModel>,
    pub pipeline: Arc<Pipeline>,
    pub deploy_lock: DeployLock,
    /// Report of the most recent completed apply.
    pub last_apply: Arc<RwLock<Option<ApplyReport>>>,
}
