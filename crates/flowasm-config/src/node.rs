use serde::{Deserialize, Serialize};

use crate::input::ConfigMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
  pub id: String,
  /// `"<connector>.<action>"`, e.g. `"asm.compile"`.
  #[serde(rename = "type")]
  pub node_type: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default)]
  pub config: ConfigMap,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub meta: Option<ConfigMap>,
}

impl NodeDef {
  /// Name of the connector this node dispatches to.
  pub fn connector_name(&self) -> &str {
    split_node_type(&self.node_type).0
  }

  /// Action requested from the connector.
  pub fn action(&self) -> &str {
    split_node_type(&self.node_type).1
  }
}

/// Split a node type on its first `.` into `(connector, action)`.
///
/// A type without a `.` names only a connector; the action is empty.
pub fn split_node_type(node_type: &str) -> (&str, &str) {
  node_type.split_once('.').unwrap_or((node_type, ""))
}
