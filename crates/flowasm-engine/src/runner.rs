//! Workflow runner: connector registration, a catalog of named workflows, and
//! health reporting on top of [`FlowEngine`].

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use flowasm_asm::AsmSandboxConnector;
use flowasm_config::{ConnectorSettings, WorkflowDef};
use flowasm_connector::{Connector, ConnectorRegistry};
use flowasm_connectors::{HttpTransport, Tk5Connector, Transport, ZeroFrameConnector, ZosConnector};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::engine::FlowEngine;
use crate::error::RunnerError;
use crate::events::{ExecutionNotifier, NoopNotifier};
use crate::result::RunResult;

/// Catalog entry returned by [`WorkflowRunner::list_workflows`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
  pub id: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub node_count: usize,
}

/// Health of one connector as reported by its availability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectorHealth {
  Up,
  Stubbed,
}

/// Service health: always `UP`, plus per-connector status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
  pub status: String,
  pub service: String,
  pub connectors: BTreeMap<String, ConnectorHealth>,
}

/// Holds connectors and named workflows, and runs them through a
/// [`FlowEngine`].
///
/// ```ignore
/// let mut runner = WorkflowRunner::new();
/// runner.register_connector("asm", Arc::new(AsmSandboxConnector::new()));
/// runner.initialize();
/// runner.load_workflow(workflow);
/// let result = runner.execute_workflow("payroll-demo").await?;
/// ```
pub struct WorkflowRunner<N: ExecutionNotifier + Clone = NoopNotifier> {
  registry: ConnectorRegistry,
  workflows: Vec<WorkflowDef>,
  engine: Option<FlowEngine<N>>,
  notifier: N,
}

impl WorkflowRunner<NoopNotifier> {
  pub fn new() -> Self {
    Self::with_notifier(NoopNotifier)
  }

  /// A runner with the sandbox and the three remote connectors registered
  /// from `settings`. The TK5 emulator is probed once.
  pub async fn with_default_connectors(settings: &ConnectorSettings) -> Self {
    let mut runner = Self::new();
    runner.register_defaults(settings).await;
    runner
  }
}

impl Default for WorkflowRunner<NoopNotifier> {
  fn default() -> Self {
    Self::new()
  }
}

impl<N: ExecutionNotifier + Clone> WorkflowRunner<N> {
  pub fn with_notifier(notifier: N) -> Self {
    Self {
      registry: ConnectorRegistry::new(),
      workflows: Vec::new(),
      engine: None,
      notifier,
    }
  }

  /// Register `asm`, `tk5`, `zos` and `zeroframe`.
  ///
  /// Invalid endpoints are logged and left unset, so those connectors stub.
  /// The remote connectors share one HTTP client bounded by
  /// `settings.request_timeout_ms`.
  pub async fn register_defaults(&mut self, settings: &ConnectorSettings) {
    let mut settings = settings.clone();
    for error in settings.discard_invalid_endpoints() {
      warn!(error = %error, "connector_settings_invalid");
    }

    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::with_timeout(Duration::from_millis(
      settings.request_timeout_ms,
    )));

    let tk5 = Tk5Connector::new(settings.tk5, transport.clone());
    tk5.probe().await;

    self.register_connector("asm", Arc::new(AsmSandboxConnector::new()));
    self.register_connector("tk5", Arc::new(tk5));
    self.register_connector("zos", Arc::new(ZosConnector::new(settings.zos, transport.clone())));
    self.register_connector(
      "zeroframe",
      Arc::new(ZeroFrameConnector::new(settings.zeroframe, transport)),
    );
  }

  /// Register a connector under `name`. Any engine built earlier is
  /// discarded; call [`initialize`](Self::initialize) again.
  pub fn register_connector(&mut self, name: impl Into<String>, connector: Arc<dyn Connector>) {
    let name = name.into();
    info!(connector = %name, available = connector.is_available(), "connector_registered");
    self.registry.register(name, connector);
    self.engine = None;
  }

  /// Build the engine over the connectors registered so far.
  pub fn initialize(&mut self) {
    self.engine = Some(build_engine(&self.registry, &self.notifier));
  }

  pub fn is_initialized(&self) -> bool {
    self.engine.is_some()
  }

  pub fn registry(&self) -> &ConnectorRegistry {
    &self.registry
  }

  /// Add a workflow to the catalog, replacing one with the same id.
  pub fn load_workflow(&mut self, workflow: WorkflowDef) {
    match self.workflows.iter_mut().find(|w| w.id == workflow.id) {
      Some(existing) => *existing = workflow,
      None => self.workflows.push(workflow),
    }
  }

  /// Read a workflow definition file into the catalog. Returns its id.
  pub async fn load_workflow_file(&mut self, path: impl AsRef<Path>) -> Result<String, RunnerError> {
    let workflow = WorkflowDef::from_file(path).await?;
    let id = workflow.id.clone();
    self.load_workflow(workflow);
    Ok(id)
  }

  /// Load every `*.json` file in a directory, in file name order. Returns the
  /// loaded ids.
  pub async fn load_workflow_dir(&mut self, dir: impl AsRef<Path>) -> Result<Vec<String>, RunnerError> {
    let dir = dir.as_ref();
    let io_error = |source| flowasm_config::ConfigError::Io {
      path: dir.display().to_string(),
      source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_error)?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
      let path = entry.path();
      if path.extension().is_some_and(|ext| ext == "json") {
        paths.push(path);
      }
    }
    paths.sort();

    let mut ids = Vec::with_capacity(paths.len());
    for path in paths {
      ids.push(self.load_workflow_file(&path).await?);
    }
    Ok(ids)
  }

  pub fn get_workflow(&self, id: &str) -> Option<&WorkflowDef> {
    self.workflows.iter().find(|w| w.id == id)
  }

  /// Run a catalogued workflow. Requires [`initialize`](Self::initialize).
  #[instrument(name = "runner_execute_workflow", skip(self))]
  pub async fn execute_workflow(&self, id: &str) -> Result<RunResult, RunnerError> {
    let engine = self.engine.as_ref().ok_or(RunnerError::NotInitialized)?;
    let workflow = self
      .get_workflow(id)
      .ok_or_else(|| RunnerError::WorkflowNotFound { id: id.to_string() })?;
    Ok(engine.execute(workflow).await)
  }

  /// Run a workflow definition directly, initializing on first use.
  #[instrument(name = "runner_execute", skip(self, workflow), fields(workflow_id = %workflow.id))]
  pub async fn execute(&mut self, workflow: &WorkflowDef) -> RunResult {
    let engine = self
      .engine
      .get_or_insert_with(|| build_engine(&self.registry, &self.notifier));
    engine.execute(workflow).await
  }

  /// Catalog contents in load order.
  pub fn list_workflows(&self) -> Vec<WorkflowSummary> {
    self
      .workflows
      .iter()
      .map(|w| WorkflowSummary {
        id: w.id.clone(),
        name: w.name.clone(),
        description: w.description.clone(),
        node_count: w.nodes.len(),
      })
      .collect()
  }

  /// `UP` or `STUBBED` for every registered connector.
  pub fn connector_status(&self) -> BTreeMap<String, ConnectorHealth> {
    self
      .registry
      .iter()
      .map(|(name, connector)| {
        let health = if connector.is_available() {
          ConnectorHealth::Up
        } else {
          ConnectorHealth::Stubbed
        };
        (name.to_string(), health)
      })
      .collect()
  }

  pub fn health(&self) -> HealthReport {
    HealthReport {
      status: "UP".to_string(),
      service: "FlowASM".to_string(),
      connectors: self.connector_status(),
    }
  }
}

fn build_engine<N: ExecutionNotifier + Clone>(registry: &ConnectorRegistry, notifier: &N) -> FlowEngine<N> {
  FlowEngine::with_notifier(Arc::new(registry.clone()), notifier.clone())
}
