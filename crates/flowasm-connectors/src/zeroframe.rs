//! ZeroFrame 3270 terminal automation connector.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use flowasm_config::ZeroFrameSettings;
use flowasm_connector::{Connector, ConnectorError, ConnectorRequest, ConnectorResponse};
use serde_json::{Value, json};
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use crate::error::CallError;
use crate::transport::{HttpTransport, Transport, endpoint_url};
use crate::value_text;

const CONNECTOR: &str = "zeroframe";
const STUB_SCREEN: &str = "*** STUBBED 3270 SCREEN ***\nREADY\n";
const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroFrameAction {
  Send,
  Read,
  Wait,
}

impl ZeroFrameAction {
  pub fn parse(action: &str) -> Option<Self> {
    match action {
      "send" => Some(Self::Send),
      "read" => Some(Self::Read),
      "wait" => Some(Self::Wait),
      _ => None,
    }
  }

  fn stub(self, request: &ConnectorRequest) -> ConnectorResponse {
    let response = ConnectorResponse::stubbed(&request.run_id, CONNECTOR);
    match self {
      Self::Send => response
        .with_artifact("screenText", STUB_SCREEN)
        .with_artifact("cursorPosition", json!({ "row": 1, "col": 1 }))
        .with_log(format!(
          "[STUBBED] Sent {} to 3270 (endpoint not configured)",
          request.input_str("action").unwrap_or("action")
        )),
      Self::Read => response
        .with_artifact("screenText", STUB_SCREEN)
        .with_artifact("fields", json!([]))
        .with_log("[STUBBED] Read 3270 screen (endpoint not configured)"),
      Self::Wait => {
        let expected = request.input_str("expectedText").unwrap_or("READY");
        response
          .with_artifact("matched", true)
          .with_artifact(
            "screenText",
            format!("*** STUBBED 3270 SCREEN ***\n{}\n", expected),
          )
          .with_artifact("waitTime", 100)
          .with_log(format!(
            "[STUBBED] Found \"{}\" (endpoint not configured)",
            expected
          ))
      }
    }
  }
}

pub struct ZeroFrameConnector {
  endpoint: Option<String>,
  poll_interval: Duration,
  transport: Arc<dyn Transport>,
}

impl ZeroFrameConnector {
  pub fn new(settings: ZeroFrameSettings, transport: Arc<dyn Transport>) -> Self {
    Self {
      endpoint: settings.endpoint,
      poll_interval: Duration::from_millis(settings.poll_interval_ms),
      transport,
    }
  }

  pub fn from_settings(settings: ZeroFrameSettings) -> Self {
    Self::new(settings, Arc::new(HttpTransport::new()))
  }

  async fn send(&self, endpoint: &str, request: &ConnectorRequest) -> Result<ConnectorResponse, CallError> {
    let url = endpoint_url(endpoint, "/api/3270/send")?;
    let input = |field: &str| request.inputs.get(field).cloned().unwrap_or(Value::Null);
    let body = json!({
      "action": input("action"),
      "text": input("text"),
      "position": input("position"),
    });
    let result = self.transport.post_json(&url, &body).await?;

    Ok(
      ConnectorResponse::success(&request.run_id)
        .with_artifact("screenText", result["screen"].clone())
        .with_artifact("cursorPosition", result["cursor"].clone())
        .with_log(format!(
          "Sent {} to 3270 terminal",
          value_text(&input("action"))
        )),
    )
  }

  async fn read(&self, endpoint: &str, request: &ConnectorRequest) -> Result<ConnectorResponse, CallError> {
    let url = endpoint_url(endpoint, "/api/3270/screen")?;
    let result = self.transport.get_json(&url, None).await?;

    Ok(
      ConnectorResponse::success(&request.run_id)
        .with_artifact("screenText", result["screen"].clone())
        .with_artifact("fields", result["fields"].clone())
        .with_log("Read 3270 screen"),
    )
  }

  /// Poll the screen until `expectedText` shows up or `timeout` ms elapse.
  async fn wait(&self, endpoint: &str, request: &ConnectorRequest) -> Result<ConnectorResponse, CallError> {
    let expected = request.require_str("expectedText")?;
    let timeout = request
      .inputs
      .get("timeout")
      .and_then(Value::as_u64)
      .filter(|ms| *ms > 0)
      .unwrap_or(DEFAULT_WAIT_TIMEOUT_MS);
    let timeout = Duration::from_millis(timeout);
    let url = endpoint_url(endpoint, "/api/3270/screen")?;

    let start = Instant::now();
    let deadline = start + timeout;
    while Instant::now() < deadline {
      // A poll that outlives the deadline counts as a timeout.
      let Ok(result) = tokio::time::timeout_at(deadline, self.transport.get_json(&url, None)).await
      else {
        break;
      };
      let result = result?;
      let screen = result["screen"].as_str().unwrap_or_default();

      if screen.contains(expected) {
        return Ok(
          ConnectorResponse::success(&request.run_id)
            .with_artifact("matched", true)
            .with_artifact("screenText", screen)
            .with_artifact("waitTime", start.elapsed().as_millis() as u64)
            .with_log(format!("Found \"{}\" on screen", expected)),
        );
      }

      tokio::time::sleep(self.poll_interval).await;
    }

    Ok(
      ConnectorResponse::fail(&request.run_id)
        .with_artifact("matched", false)
        .with_log(format!("Timeout waiting for \"{}\"", expected)),
    )
  }
}

#[async_trait]
impl Connector for ZeroFrameConnector {
  #[instrument(
    name = "zeroframe_execute",
    skip(self, request),
    fields(run_id = %request.run_id, node_type = %request.node_type)
  )]
  async fn execute(&self, request: ConnectorRequest) -> Result<ConnectorResponse, ConnectorError> {
    let Some(action) = ZeroFrameAction::parse(request.action()) else {
      warn!(connector = CONNECTOR, action = %request.action(), "connector_unknown_action");
      return Ok(
        ConnectorResponse::unknown_action(&request.run_id, "3270", request.action())
          .with_metadata("connector", CONNECTOR),
      );
    };

    let Some(endpoint) = self.endpoint.as_deref() else {
      info!(connector = CONNECTOR, reason = "endpoint not configured", "connector_stubbed");
      return Ok(action.stub(&request));
    };

    let result = match action {
      ZeroFrameAction::Send => self.send(endpoint, &request).await,
      ZeroFrameAction::Read => self.read(endpoint, &request).await,
      ZeroFrameAction::Wait => self.wait(endpoint, &request).await,
    };

    match result {
      Ok(response) => Ok(
        response
          .with_metadata("connector", CONNECTOR)
          .with_metadata("stubbed", false),
      ),
      Err(CallError::Input(e)) => Err(e),
      Err(CallError::Transport(e)) => {
        warn!(connector = CONNECTOR, error = %e, "connector_stubbed");
        Ok(action.stub(&request))
      }
    }
  }

  fn is_available(&self) -> bool {
    self.endpoint.is_some()
  }
}
