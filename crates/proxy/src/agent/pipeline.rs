//! The apply pipeline: schema, write, route, nav, build, deploy.
//!
//! Steps run in that order and every step is logged. The first failure
//! stops the run; work done by earlier steps stays in place.

use std::time::Duration;

use chrono::Utc;
use pagepilot_core::registry::{NavItem, Registration, RouteEntry};
use pagepilot_core::types::Timestamp;
use pagepilot_db::DynStore;
use serde::{Deserialize, Serialize};

use crate::agent::command::run_shell;
use crate::agent::plan::{GeneratedFile, SchemaSpec};
use crate::agent::schema;
use crate::agent::workspace::DashboardDir;
use crate::error::ProxyError;

pub const BUILD_TIMEOUT: Duration = Duration::from_secs(120);

/// Deploys get the same budget as builds.
pub const DEPLOY_TIMEOUT: Duration = Duration::from_secs(120);

/// Lines of command output kept in a failure message.
const OUTPUT_TAIL_LINES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Schema,
    Write,
    Route,
    Nav,
    Build,
    Deploy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepLog {
    pub step: Step,
    pub ok: bool,
    pub message: String,
}

/// What `/agent/apply` should do. Every part is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    #[serde(default)]
    pub files: Vec<GeneratedFile>,
    #[serde(default)]
    pub route: Option<RouteEntry>,
    #[serde(default)]
    pub nav_item: Option<NavItem>,
    #[serde(default)]
    pub schema: Option<SchemaSpec>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub success: bool,
    pub log: Vec<StepLog>,
    pub finished_at: Timestamp,
}

pub struct Pipeline {
    pub dashboard: DashboardDir,
    pub store: DynStore,
    pub build_command: String,
    pub deploy_command: Option<String>,
    pub build_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        dashboard: DashboardDir,
        store: DynStore,
        build_command: impl Into<String>,
        deploy_command: Option<String>,
    ) -> Self {
        Self {
            dashboard,
            store,
            build_command: build_command.into(),
            deploy_command,
            build_timeout: BUILD_TIMEOUT,
        }
    }

    /// Run every step of `request`. Never fails as a whole: failures are
    /// recorded in the returned log.
    pub async fn run(&self, request: ApplyRequest) -> ApplyReport {
        let mut log = Vec::new();
        let success = self.run_steps(request, &mut log).await.is_ok();
        tracing::info!(success, steps = log.len(), "Apply pipeline finished");
        ApplyReport {
            success,
            log,
            finished_at: Utc::now(),
        }
    }

    async fn run_steps(&self, request: ApplyRequest, log: &mut Vec<StepLog>) -> Result<(), Stopped> {
        if let Some(spec) = &request.schema {
            let outcome = schema::create_class(self.store.as_ref(), spec)
                .await
                .map(|()| format!("Created class {}", spec.class_name));
            record(log, Step::Schema, outcome)?;
        }

        if !request.files.is_empty() {
            let outcome = self.write_files(&request.files).await;
            record(log, Step::Write, outcome)?;
        }

        if let Some(route) = request.route {
            let outcome = self.register_route(route).await;
            record(log, Step::Route, outcome)?;
        }

        if let Some(item) = request.nav_item {
            let outcome = self.register_nav(item).await;
            record(log, Step::Nav, outcome)?;
        }

        let outcome = self.shell(&self.build_command, self.build_timeout).await;
        record(log, Step::Build, outcome)?;

        let outcome = match &self.deploy_command {
            Some(command) => self.shell(command, DEPLOY_TIMEOUT).await,
            None => Ok("Skipped: DEPLOY_COMMAND not set".to_string()),
        };
        record(log, Step::Deploy, outcome)
    }

    async fn write_files(&self, files: &[GeneratedFile]) -> Result<String, ProxyError> {
        // Validate every path before touching the disk.
        for file in files {
            self.dashboard.resolve(&file.path)?;
        }
        for file in files {
            self.dashboard.write_file(&file.path, &file.content).await?;
        }
        let names: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        Ok(format!("Wrote {}", names.join(", ")))
    }

    async fn register_route(&self, route: RouteEntry) -> Result<String, ProxyError> {
        let mut registry = self.dashboard.load_registry().await?;
        let path = route.path.clone();
        let outcome = registry.add_route(route)?;
        self.dashboard.save_registry(&registry).await?;
        Ok(describe("route", &path, outcome))
    }

    async fn register_nav(&self, item: NavItem) -> Result<String, ProxyError> {
        let mut registry = self.dashboard.load_registry().await?;
        let path = item.path.clone();
        let outcome = registry.add_nav_item(item)?;
        self.dashboard.save_registry(&registry).await?;
        Ok(describe("nav item", &path, outcome))
    }

    async fn shell(&self, command: &str, timeout: Duration) -> Result<String, ProxyError> {
        let output = run_shell(command, self.dashboard.root(), timeout).await?;
        if output.success() {
            Ok(format!("'{command}' finished in {}ms", output.duration_ms))
        } else {
            Err(ProxyError::CommandFailed {
                command: command.to_string(),
                exit_code: output.exit_code,
                output: output.tail(OUTPUT_TAIL_LINES),
            })
        }
    }
}

fn describe(kind: &str, path: &str, outcome: Registration) -> String {
    match outcome {
        Registration::Added => format!("Added {kind} {path}"),
        Registration::Replaced => format!("Replaced {kind} {path}"),
        Registration::Unchanged => format!("{kind} {path} already registered"),
    }
}

/// A step failed; the remaining steps are skipped.
struct Stopped;

/// Append the step outcome to `log`.
fn record(
    log: &mut Vec<StepLog>,
    step: Step,
    outcome: Result<String, ProxyError>,
) -> Result<(), Stopped> {
    match outcome {
        Ok(message) => {
            tracing::info!(?step, %message, "Apply step succeeded");
            log.push(StepLog {
                step,
                ok: true,
                message,
            });
            Ok(())
        }
        Err(e) => {
            tracing::warn!(?step, error = %e, "Apply step failed");
            log.push(StepLog {
                step,
                ok: false,
                message: e.to_string(),
            });
            Err(Stopped)
        }
    }
}
