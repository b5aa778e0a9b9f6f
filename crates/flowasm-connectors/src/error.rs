use thiserror::Error;

/// Errors raised by a [`Transport`](crate::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
  /// The endpoint could not be turned into a request URL.
  #[error("invalid url '{url}': {message}")]
  InvalidUrl { url: String, message: String },

  /// The request never produced a response.
  #[error("request to {url} failed: {message}")]
  Request { url: String, message: String },

  /// The backend did not answer within the request timeout.
  #[error("request to {url} timed out after {timeout_ms}ms")]
  Timeout { url: String, timeout_ms: u64 },

  /// The backend answered with a non-success status.
  #[error("{url} returned HTTP {status}")]
  Status { url: String, status: u16 },

  /// The response body was not what the caller expected.
  #[error("unreadable response from {url}: {message}")]
  Decode { url: String, message: String },
}

/// Why a backend call did not produce a response.
#[derive(Debug, Error)]
pub(crate) enum CallError {
  /// The node's inputs were unusable; surfaced to the engine as-is.
  #[error(transparent)]
  Input(#[from] flowasm_connector::ConnectorError),

  /// The backend could not be reached or answered badly.
  #[error(transparent)]
  Transport(#[from] TransportError),
}
