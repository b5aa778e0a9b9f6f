//! Engine and runner error types.

use flowasm_config::ConfigError;
use flowasm_connector::ConnectorError;

/// Errors raised at a node boundary. The engine records them on the failing
/// node; they never escape [`FlowEngine::execute`](crate::FlowEngine::execute).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  /// No connector is registered under the node type's prefix.
  #[error("connector not found: {name}")]
  ConnectorNotFound { name: String },

  /// The connector returned an error instead of a response.
  #[error("connector failed for node '{node_id}': {source}")]
  Connector {
    node_id: String,
    #[source]
    source: ConnectorError,
  },

  /// The connector panicked or its task was aborted.
  #[error("connector panicked for node '{node_id}': {message}")]
  ConnectorPanicked { node_id: String, message: String },
}

/// Errors returned by [`WorkflowRunner`](crate::WorkflowRunner).
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
  #[error("runner not initialized; call initialize() first")]
  NotInitialized,

  #[error("workflow not found: {id}")]
  WorkflowNotFound { id: String },

  #[error(transparent)]
  Config(#[from] ConfigError),
}
