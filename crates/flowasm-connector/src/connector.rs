use async_trait::async_trait;

use crate::error::ConnectorError;
use crate::types::{ConnectorRequest, ConnectorResponse};

/// A backend that can execute workflow nodes.
///
/// Connectors own their availability: one that cannot reach its backend
/// should answer with a stubbed response (see [`ConnectorResponse::stubbed`])
/// rather than an error, and report `FAIL` only when no safe synthetic answer
/// exists. Unknown actions are always a `FAIL` response.
///
/// Returning `Err` is reserved for failures the connector cannot express as a
/// response (bad inputs, broken invariants). The engine records the error on
/// the node and halts the run.
#[async_trait]
pub trait Connector: Send + Sync {
  /// Execute one node invocation.
  async fn execute(&self, request: ConnectorRequest) -> Result<ConnectorResponse, ConnectorError>;

  /// Whether the backend is believed to be reachable.
  ///
  /// Advisory only; the engine never consults it.
  fn is_available(&self) -> bool {
    true
  }
}
