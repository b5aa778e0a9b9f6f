//! Workflow execution engine.
//!
//! [`FlowEngine`] runs a workflow's nodes strictly in order. Before each
//! dispatch the node's config is resolved against the results collected so
//! far; the first node that does not succeed ends the run.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use flowasm_config::{ConfigMap, NodeDef, WorkflowDef};
use flowasm_connector::{ConnectorRegistry, ConnectorRequest, ConnectorResponse};
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, instrument, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::result::{NodeResult, RunResult, RunStatus};
use crate::template::resolve_config;

/// What the run loop does after a node.
#[derive(Debug)]
pub enum NodeOutcome {
  /// The node succeeded; move on to the next one.
  Continue(NodeResult),
  /// The node failed; record it and stop.
  Halt(NodeResult),
}

/// The workflow execution engine.
///
/// Generic over `N: ExecutionNotifier`. Use [`FlowEngine::new`] for an engine
/// that discards events, or [`FlowEngine::with_notifier`] to observe them.
/// The registry is shared read-only, so one engine can serve concurrent runs.
pub struct FlowEngine<N: ExecutionNotifier = NoopNotifier> {
  registry: Arc<ConnectorRegistry>,
  notifier: N,
}

impl FlowEngine<NoopNotifier> {
  pub fn new(registry: Arc<ConnectorRegistry>) -> Self {
    Self::with_notifier(registry, NoopNotifier)
  }
}

impl<N: ExecutionNotifier> FlowEngine<N> {
  pub fn with_notifier(registry: Arc<ConnectorRegistry>, notifier: N) -> Self {
    Self { registry, notifier }
  }

  pub fn registry(&self) -> &ConnectorRegistry {
    &self.registry
  }

  /// Execute a workflow. Always returns the full result; failures are
  /// reported through its status, node results and logs.
  ///
  /// Dropping the returned future aborts the in-flight connector call.
  #[instrument(
    name = "workflow_execute",
    skip(self, workflow),
    fields(workflow_id = %workflow.id)
  )]
  pub async fn execute(&self, workflow: &WorkflowDef) -> RunResult {
    let execution_id = Uuid::new_v4().to_string();
    let started = Instant::now();
    let mut run = RunResult::running(workflow);

    info!(
      execution_id = %execution_id,
      workflow_id = %workflow.id,
      nodes = workflow.nodes.len(),
      "workflow_started"
    );
    self.notifier.notify(ExecutionEvent::WorkflowStarted {
      execution_id: execution_id.clone(),
      workflow_id: workflow.id.clone(),
    });

    match workflow.validate() {
      Ok(()) => self.run_nodes(workflow, &mut run, &execution_id).await,
      Err(e) => {
        run.status = RunStatus::Error;
        run.logs.push(format!("Workflow error: {}", e));
      }
    }

    run.duration_ms = elapsed_ms(started);

    match run.status {
      RunStatus::Success => {
        info!(
          execution_id = %execution_id,
          duration_ms = run.duration_ms,
          "workflow_completed"
        );
        self.notifier.notify(ExecutionEvent::WorkflowCompleted {
          execution_id,
          duration_ms: run.duration_ms,
        });
      }
      status => {
        let reason = run.logs.last().cloned().unwrap_or_default();
        error!(
          execution_id = %execution_id,
          status = ?status,
          error = %reason,
          "workflow_failed"
        );
        self.notifier.notify(ExecutionEvent::WorkflowFailed {
          execution_id,
          status,
          error: reason,
        });
      }
    }

    run
  }

  async fn run_nodes(&self, workflow: &WorkflowDef, run: &mut RunResult, execution_id: &str) {
    for node in &workflow.nodes {
      self.notifier.notify(ExecutionEvent::NodeStarted {
        execution_id: execution_id.to_string(),
        node_id: node.id.clone(),
        node_type: node.node_type.clone(),
      });

      match self.execute_node(node, &run.nodes, execution_id).await {
        NodeOutcome::Continue(result) => {
          self.notifier.notify(ExecutionEvent::NodeCompleted {
            execution_id: execution_id.to_string(),
            result: result.clone(),
          });
          run.nodes.push(result);
        }
        NodeOutcome::Halt(result) => {
          let reason = result.failure_reason().to_string();
          run.logs.push(format!("Node {} failed: {}", node.id, reason));
          self.notifier.notify(ExecutionEvent::NodeFailed {
            execution_id: execution_id.to_string(),
            result: result.clone(),
            error: reason,
          });
          run.nodes.push(result);
          run.status = RunStatus::Failed;
          return;
        }
      }
    }
    run.status = RunStatus::Success;
  }

  /// Resolve, dispatch and record one node.
  #[instrument(
    name = "node_execute",
    skip(self, node, prior, execution_id),
    fields(execution_id = %execution_id, node_id = %node.id, node_type = %node.node_type)
  )]
  pub async fn execute_node(
    &self,
    node: &NodeDef,
    prior: &[NodeResult],
    execution_id: &str,
  ) -> NodeOutcome {
    let started = Instant::now();
    let inputs = resolve_config(&node.config, prior);
    let mut result = NodeResult::pending(node, inputs.clone());

    info!(node_id = %node.id, node_type = %node.node_type, "node_started");

    match self.dispatch(node, inputs).await {
      Ok(response) => {
        result.success = response.is_success();
        result.artifacts = response.artifacts;
        result.logs = response.logs;
        result.metadata = response.metadata;
      }
      Err(e) => {
        result.error = Some(e.to_string());
        result.logs.push(format!("Error: {}", e));
      }
    }
    result.duration_ms = elapsed_ms(started);

    if result.success {
      info!(
        node_id = %node.id,
        duration_ms = result.duration_ms,
        stubbed = result.is_stubbed(),
        "node_completed"
      );
      NodeOutcome::Continue(result)
    } else {
      warn!(
        node_id = %node.id,
        error = %result.failure_reason(),
        "node_failed"
      );
      NodeOutcome::Halt(result)
    }
  }

  async fn dispatch(&self, node: &NodeDef, inputs: ConfigMap) -> Result<ConnectorResponse, EngineError> {
    let name = node.connector_name();
    let connector = self
      .registry
      .get(name)
      .ok_or_else(|| EngineError::ConnectorNotFound {
        name: name.to_string(),
      })?;

    let request = ConnectorRequest {
      run_id: format!("{}_{}", node.id, Uuid::new_v4()),
      node_type: node.node_type.clone(),
      inputs,
      meta: node.meta.clone().unwrap_or_default(),
    };

    // Run on its own task so a panicking connector fails only this node.
    // The task is aborted if this future is dropped first.
    let mut task = AbortOnDrop(tokio::spawn(
      async move { connector.execute(request).await }.instrument(tracing::Span::current()),
    ));

    match (&mut task.0).await {
      Ok(Ok(response)) => Ok(response),
      Ok(Err(source)) => Err(EngineError::Connector {
        node_id: node.id.clone(),
        source,
      }),
      Err(join_error) => Err(EngineError::ConnectorPanicked {
        node_id: node.id.clone(),
        message: if join_error.is_panic() {
          panic_message(join_error.into_panic())
        } else {
          join_error.to_string()
        },
      }),
    }
  }
}

/// Owns a spawned connector call and aborts it on drop.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
  fn drop(&mut self) {
    self.0.abort();
  }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
  match payload.downcast::<String>() {
    Ok(message) => *message,
    Err(payload) => match payload.downcast::<&'static str>() {
      Ok(message) => message.to_string(),
      Err(_) => "unknown panic".to_string(),
    },
  }
}

fn elapsed_ms(started: Instant) -> u64 {
  u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
