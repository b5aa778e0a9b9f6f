//! TK5/Hercules emulator connector.
//!
//! The emulator is reachable at `Tk5Settings::endpoint`. Availability is
//! decided by [`Tk5Connector::probe`]; until a probe succeeds every action
//! answers with a stub, and a failing call on a reachable emulator degrades to
//! the stub for that action.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use flowasm_config::Tk5Settings;
use flowasm_connector::{Connector, ConnectorError, ConnectorRequest, ConnectorResponse};
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use crate::error::CallError;
use crate::transport::{HttpTransport, Transport, endpoint_url};
use crate::value_text;

const CONNECTOR: &str = "tk5";
const DEFAULT_VOLUME: &str = "SYSRES";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tk5Action {
  Submit,
  Ipl,
  Status,
}

impl Tk5Action {
  pub fn parse(action: &str) -> Option<Self> {
    match action {
      "submit" => Some(Self::Submit),
      "ipl" => Some(Self::Ipl),
      "status" => Some(Self::Status),
      _ => None,
    }
  }

  fn stub(self, run_id: &str) -> ConnectorResponse {
    let response = ConnectorResponse::stubbed(run_id, CONNECTOR);
    match self {
      Self::Submit => response
        .with_artifact("jobId", "JOB00001")
        .with_artifact("returnCode", 0)
        .with_log("[STUBBED] Job submitted to TK5 (emulator not available)"),
      Self::Ipl => response
        .with_artifact("iplStatus", "COMPLETE")
        .with_log("[STUBBED] IPL completed (emulator not available)"),
      Self::Status => response
        .with_artifact("jobStatus", "COMPLETE")
        .with_artifact("returnCode", 0)
        .with_log("[STUBBED] Job status retrieved (emulator not available)"),
    }
  }
}

pub struct Tk5Connector {
  settings: Tk5Settings,
  transport: Arc<dyn Transport>,
  available: AtomicBool,
}

impl Tk5Connector {
  /// Create an unprobed connector. It stubs every action until
  /// [`probe`](Self::probe) reaches the emulator.
  pub fn new(settings: Tk5Settings, transport: Arc<dyn Transport>) -> Self {
    Self {
      settings,
      transport,
      available: AtomicBool::new(false),
    }
  }

  /// Create a connector over HTTP and probe the emulator once.
  pub async fn connect(settings: Tk5Settings) -> Self {
    let connector = Self::new(settings, Arc::new(HttpTransport::new()));
    connector.probe().await;
    connector
  }

  /// Check `GET /api/status` within the probe timeout and record the result.
  #[instrument(name = "tk5_probe", skip(self), fields(endpoint = %self.settings.endpoint))]
  pub async fn probe(&self) -> bool {
    let timeout = Duration::from_millis(self.settings.probe_timeout_ms);
    let reachable = match endpoint_url(&self.settings.endpoint, "/api/status") {
      Ok(url) => matches!(
        tokio::time::timeout(timeout, self.transport.get_text(&url, None)).await,
        Ok(Ok(_))
      ),
      Err(_) => false,
    };

    self.available.store(reachable, Ordering::Relaxed);
    info!(connector = CONNECTOR, available = reachable, "connector_probed");
    reachable
  }

  async fn submit(&self, request: &ConnectorRequest) -> Result<ConnectorResponse, CallError> {
    let url = endpoint_url(&self.settings.endpoint, "/api/submit")?;
    let jcl = request.require_str("jcl")?;
    let body = json!({
      "jcl": jcl,
      "jobName": request.inputs.get("jobName").cloned().unwrap_or(Value::Null),
    });
    let result = self.transport.post_json(&url, &body).await?;

    Ok(
      ConnectorResponse::success(&request.run_id)
        .with_artifact("jobId", result["jobId"].clone())
        .with_artifact("returnCode", result["returnCode"].clone())
        .with_log(format!("Job {} submitted to TK5", value_text(&result["jobId"])))
        .with_metadata("connector", CONNECTOR)
        .with_metadata("stubbed", false),
    )
  }

  async fn ipl(&self, request: &ConnectorRequest) -> Result<ConnectorResponse, CallError> {
    let url = endpoint_url(&self.settings.endpoint, "/api/ipl")?;
    let volume = request.input_str("volume").unwrap_or(DEFAULT_VOLUME);
    let result = self
      .transport
      .post_json(&url, &json!({ "volume": volume }))
      .await?;

    Ok(
      ConnectorResponse::success(&request.run_id)
        .with_artifact("iplStatus", result["status"].clone())
        .with_log(format!("IPL completed on {}", volume))
        .with_metadata("connector", CONNECTOR)
        .with_metadata("stubbed", false),
    )
  }

  async fn status(&self, request: &ConnectorRequest) -> Result<ConnectorResponse, CallError> {
    let job_id = request
      .inputs
      .get("jobId")
      .filter(|v| !v.is_null())
      .map(value_text)
      .ok_or_else(|| ConnectorError::MissingInput {
        field: "jobId".to_string(),
      })?;
    let url = endpoint_url(&self.settings.endpoint, &format!("/api/jobs/{}", job_id))?;
    let result = self.transport.get_json(&url, None).await?;

    Ok(
      ConnectorResponse::success(&request.run_id)
        .with_artifact("jobStatus", result["status"].clone())
        .with_artifact("returnCode", result["returnCode"].clone())
        .with_log(format!(
          "Job {} status: {}",
          job_id,
          value_text(&result["status"])
        ))
        .with_metadata("connector", CONNECTOR)
        .with_metadata("stubbed", false),
    )
  }
}

#[async_trait]
impl Connector for Tk5Connector {
  #[instrument(
    name = "tk5_execute",
    skip(self, request),
    fields(run_id = %request.run_id, node_type = %request.node_type)
  )]
  async fn execute(&self, request: ConnectorRequest) -> Result<ConnectorResponse, ConnectorError> {
    let Some(action) = Tk5Action::parse(request.action()) else {
      warn!(connector = CONNECTOR, action = %request.action(), "connector_unknown_action");
      return Ok(
        ConnectorResponse::unknown_action(&request.run_id, "TK5", request.action())
          .with_metadata("connector", CONNECTOR),
      );
    };

    if !self.is_available() {
      info!(connector = CONNECTOR, reason = "emulator not available", "connector_stubbed");
      return Ok(action.stub(&request.run_id));
    }

    let result = match action {
      Tk5Action::Submit => self.submit(&request).await,
      Tk5Action::Ipl => self.ipl(&request).await,
      Tk5Action::Status => self.status(&request).await,
    };

    match result {
      Ok(response) => Ok(response),
      Err(CallError::Input(e)) => Err(e),
      Err(CallError::Transport(e)) => {
        warn!(connector = CONNECTOR, error = %e, "connector_stubbed");
        Ok(action.stub(&request.run_id))
      }
    }
  }

  fn is_available(&self) -> bool {
    self.available.load(Ordering::Relaxed)
  }
}
