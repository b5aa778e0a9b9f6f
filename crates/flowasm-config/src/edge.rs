use serde::{Deserialize, Serialize};

/// A visual connection between two nodes.
///
/// Edges are kept for authoring tools (layout, ordering hints). Execution
/// follows the order of `WorkflowDef::nodes` and never consults them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
  pub from: String,
  pub to: String,
}
