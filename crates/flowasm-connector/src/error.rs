use thiserror::Error;

/// Errors a connector can raise instead of returning a response.
///
/// The engine records these on the failing node; they never abort a run.
#[derive(Debug, Error)]
pub enum ConnectorError {
  /// Missing required input field.
  #[error("missing required input: {field}")]
  MissingInput { field: String },

  /// Invalid input value.
  #[error("invalid input '{field}': {message}")]
  InvalidInput { field: String, message: String },

  /// Backend request failed.
  #[error("backend error: {message}")]
  Backend { message: String },
}
