use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse workflow definition: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("duplicate node id '{node_id}' in workflow '{workflow_id}'")]
  DuplicateNodeId {
    workflow_id: String,
    node_id: String,
  },

  #[error("invalid endpoint for {connector}: {message}")]
  InvalidEndpoint { connector: String, message: String },
}
