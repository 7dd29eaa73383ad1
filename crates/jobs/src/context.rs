use std::sync::Arc;

use pagepilot_db::DynStore;
use pagepilot_graph::MessageSender;

use crate::config::JobsConfig;

/// Everything a job needs for one pass.
#[derive(Clone)]
pub struct JobContext {
    pub store: DynStore,
    pub sender: Arc<dyn MessageSender>,
    pub config: JobsConfig,
}

impl JobContext {
    /// Send `text` to every admin. Individual failures are logged; returns
    /// how many deliveries succeeded.
    pub async fn notify_admins(&self, text: &str) -> usize {
        let mut delivered = 0;
        for psid in &self.config.admin_psids {
            match self.sender.send_text(psid, text).await {
                Ok(()) => delivered += 1,
                Err(e) => tracing::error!(error = %e, psid, "Admin notification failed"),
            }
        }
        delivered
    }
}
