use std::sync::Arc;

use pagepilot_db::DynStore;
use pagepilot_graph::GraphClient;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Datastore handle.
    pub store: DynStore,
    pub config: Arc<ServerConfig>,
    /// Graph client for lead enrichment; `None` without a page token.
    pub graph: Option<Arc<GraphClient>>,
}
