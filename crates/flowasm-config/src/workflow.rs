use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::error::ConfigError;
use crate::node::NodeDef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub id: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  /// Nodes in execution order.
  pub nodes: Vec<NodeDef>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub connections: Option<Vec<Edge>>,
}

impl WorkflowDef {
  /// Parse a workflow definition from JSON text.
  pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
    Ok(serde_json::from_str(content)?)
  }

  /// Read and parse a workflow definition file.
  pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
      .await
      .map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
      })?;
    Self::from_json_str(&content)
  }

  /// Check that node ids are unique.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let mut seen = HashSet::with_capacity(self.nodes.len());
    for node in &self.nodes {
      if !seen.insert(node.id.as_str()) {
        return Err(ConfigError::DuplicateNodeId {
          workflow_id: self.id.clone(),
          node_id: node.id.clone(),
        });
      }
    }
    Ok(())
  }

  /// Get a node by ID.
  pub fn get_node(&self, node_id: &str) -> Option<&NodeDef> {
    self.nodes.iter().find(|n| n.id == node_id)
  }
}
