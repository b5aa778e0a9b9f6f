use flowasm_config::{ConfigMap, split_node_type};
use serde::{Deserialize, Serialize};

use crate::error::ConnectorError;

/// A request dispatched to a connector for one node invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorRequest {
  /// Unique ID of this invocation.
  pub run_id: String,

  /// Full node type, e.g. `"asm.compile"`.
  pub node_type: String,

  /// Node configuration after template resolution.
  #[serde(default)]
  pub inputs: ConfigMap,

  /// Opaque node metadata.
  #[serde(default)]
  pub meta: ConfigMap,
}

impl ConnectorRequest {
  /// The action part of the node type (everything after the first `.`).
  pub fn action(&self) -> &str {
    split_node_type(&self.node_type).1
  }

  /// A string input, if present.
  pub fn input_str(&self, field: &str) -> Option<&str> {
    self.inputs.get(field).and_then(|v| v.as_str())
  }

  /// A string input that must be present.
  pub fn require_str(&self, field: &str) -> Result<&str, ConnectorError> {
    match self.inputs.get(field) {
      Some(serde_json::Value::String(s)) => Ok(s.as_str()),
      Some(other) => Err(ConnectorError::InvalidInput {
        field: field.to_string(),
        message: format!("expected string, got {}", other),
      }),
      None => Err(ConnectorError::MissingInput {
        field: field.to_string(),
      }),
    }
  }
}

/// Outcome reported by a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectorStatus {
  Success,
  Fail,
}

/// A connector's answer to a [`ConnectorRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorResponse {
  pub run_id: String,
  pub status: ConnectorStatus,
  #[serde(default)]
  pub artifacts: ConfigMap,
  #[serde(default)]
  pub logs: Vec<String>,
  /// Conventionally carries `connector` (or `engine`) and `stubbed`.
  #[serde(default)]
  pub metadata: ConfigMap,
}

impl ConnectorResponse {
  fn new(run_id: impl Into<String>, status: ConnectorStatus) -> Self {
    Self {
      run_id: run_id.into(),
      status,
      artifacts: ConfigMap::new(),
      logs: Vec::new(),
      metadata: ConfigMap::new(),
    }
  }

  pub fn success(run_id: impl Into<String>) -> Self {
    Self::new(run_id, ConnectorStatus::Success)
  }

  pub fn fail(run_id: impl Into<String>) -> Self {
    Self::new(run_id, ConnectorStatus::Fail)
  }

  /// A successful synthetic response from a connector whose backend is absent.
  pub fn stubbed(run_id: impl Into<String>, connector: &str) -> Self {
    Self::success(run_id)
      .with_metadata("connector", connector)
      .with_metadata("stubbed", true)
  }

  /// The response for an action the connector does not support.
  pub fn unknown_action(run_id: impl Into<String>, label: &str, action: &str) -> Self {
    Self::fail(run_id).with_log(format!("Unknown {} action: {}", label, action))
  }

  pub fn is_success(&self) -> bool {
    self.status == ConnectorStatus::Success
  }

  /// Whether the connector marked this response as synthetic.
  pub fn is_stubbed(&self) -> bool {
    self
      .metadata
      .get("stubbed")
      .and_then(|v| v.as_bool())
      .unwrap_or(false)
  }

  pub fn with_artifact(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
    self.artifacts.insert(key.to_string(), value.into());
    self
  }

  pub fn with_artifacts(mut self, artifacts: ConfigMap) -> Self {
    self.artifacts.extend(artifacts);
    self
  }

  pub fn with_log(mut self, line: impl Into<String>) -> Self {
    self.logs.push(line.into());
    self
  }

  pub fn with_logs<I, S>(mut self, lines: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.logs.extend(lines.into_iter().map(Into::into));
    self
  }

  pub fn with_metadata(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
    self.metadata.insert(key.to_string(), value.into());
    self
  }
}
