//! Execution result types.

use flowasm_config::{ConfigMap, NodeDef, WorkflowDef};
use serde::{Deserialize, Serialize};

/// Result of a single node execution. Never modified once appended to a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeResult {
  pub id: String,
  #[serde(rename = "type")]
  pub node_type: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub success: bool,
  /// Config after template resolution, exactly as dispatched.
  #[serde(default)]
  pub inputs: ConfigMap,
  #[serde(default)]
  pub artifacts: ConfigMap,
  #[serde(default)]
  pub logs: Vec<String>,
  #[serde(default)]
  pub metadata: ConfigMap,
  pub duration_ms: u64,
  /// Set when the node failed before or during dispatch.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl NodeResult {
  pub(crate) fn pending(node: &NodeDef, inputs: ConfigMap) -> Self {
    Self {
      id: node.id.clone(),
      node_type: node.node_type.clone(),
      description: node.description.clone(),
      success: false,
      inputs,
      artifacts: ConfigMap::new(),
      logs: Vec::new(),
      metadata: ConfigMap::new(),
      duration_ms: 0,
      error: None,
    }
  }

  /// Whether the connector marked this result as synthetic.
  pub fn is_stubbed(&self) -> bool {
    self
      .metadata
      .get("stubbed")
      .and_then(|v| v.as_bool())
      .unwrap_or(false)
  }

  /// Best available explanation for a failed node.
  pub fn failure_reason(&self) -> &str {
    self
      .error
      .as_deref()
      .or(self.logs.last().map(String::as_str))
      .unwrap_or("connector reported FAIL")
  }
}

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
  /// Only while the engine is iterating; never returned.
  Running,
  Success,
  /// A node failed; the run stopped after it.
  Failed,
  /// The run could not start.
  Error,
}

/// Result of a complete workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
  #[serde(rename = "workflowId")]
  pub workflow_id: String,
  pub name: String,
  pub status: RunStatus,
  /// Executed nodes in order, including the one that failed.
  pub nodes: Vec<NodeResult>,
  pub logs: Vec<String>,
  pub duration_ms: u64,
}

impl RunResult {
  pub(crate) fn running(workflow: &WorkflowDef) -> Self {
    Self {
      workflow_id: workflow.id.clone(),
      name: workflow.name.clone(),
      status: RunStatus::Running,
      nodes: Vec::new(),
      logs: Vec::new(),
      duration_ms: 0,
    }
  }

  pub fn is_success(&self) -> bool {
    self.status == RunStatus::Success
  }

  pub fn node(&self, id: &str) -> Option<&NodeResult> {
    self.nodes.iter().find(|n| n.id == id)
  }
}
