use pagepilot_db::DbError;
use pagepilot_graph::GraphError;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Datastore error: {0}")]
    Db(#[from] DbError),

    #[error("Messenger error: {0}")]
    Graph(#[from] GraphError),

    /// A scheduled action that cannot be executed as stored.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// A nurture sequence whose steps cannot be scheduled.
    #[error("Invalid nurture sequence: {0}")]
    InvalidSequence(String),
}
