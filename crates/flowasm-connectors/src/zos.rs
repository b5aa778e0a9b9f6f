//! z/OS connector over the z/OSMF REST interface.
//!
//! Available only when endpoint, username and password are all configured.
//! Job submission has side effects that cannot be faked, so a failed submit
//! is a `FAIL`; reads degrade to the stub.

use std::sync::Arc;

use async_trait::async_trait;
use flowasm_config::ZosSettings;
use flowasm_connector::{Connector, ConnectorError, ConnectorRequest, ConnectorResponse};
use tracing::{error, info, instrument, warn};

use crate::error::CallError;
use crate::transport::{BasicAuth, HttpTransport, Transport, endpoint_url};
use crate::value_text;

const CONNECTOR: &str = "zos";
const NOT_CONFIGURED: &str = "z/OS credentials not configured. See docs/CREDENTIALS_TEMPLATE.md";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZosAction {
  Submit,
  Smf,
  Dataset,
}

impl ZosAction {
  pub fn parse(action: &str) -> Option<Self> {
    match action {
      "submit" => Some(Self::Submit),
      "smf" => Some(Self::Smf),
      "dataset" => Some(Self::Dataset),
      _ => None,
    }
  }
}

fn stub(run_id: &str, reason: &str) -> ConnectorResponse {
  ConnectorResponse::stubbed(run_id, CONNECTOR)
    .with_artifact("message", "z/OS connector not configured")
    .with_artifact("reason", reason)
    .with_logs([
      "[STUBBED] z/OS operation (credentials not configured)",
      "Configure: ZOS_ENDPOINT, ZOS_USERNAME, ZOS_PASSWORD",
      "See: docs/CREDENTIALS_TEMPLATE.md",
    ])
}

/// A configured backend: endpoint plus credentials.
struct Backend {
  endpoint: String,
  auth: BasicAuth,
}

pub struct ZosConnector {
  backend: Option<Backend>,
  transport: Arc<dyn Transport>,
}

impl ZosConnector {
  pub fn new(settings: ZosSettings, transport: Arc<dyn Transport>) -> Self {
    let backend = match settings {
      ZosSettings {
        endpoint: Some(endpoint),
        username: Some(username),
        password: Some(password),
      } => Some(Backend {
        endpoint,
        auth: BasicAuth::new(username, password),
      }),
      _ => None,
    };
    Self { backend, transport }
  }

  pub fn from_settings(settings: ZosSettings) -> Self {
    Self::new(settings, Arc::new(HttpTransport::new()))
  }

  async fn submit(
    &self,
    backend: &Backend,
    request: &ConnectorRequest,
  ) -> Result<ConnectorResponse, CallError> {
    let jcl = request.require_str("jcl")?;
    let url = endpoint_url(&backend.endpoint, "/zosmf/restjobs/jobs")?;
    let result = self
      .transport
      .put_text(&url, jcl.to_string(), Some(&backend.auth))
      .await?;

    Ok(
      ConnectorResponse::success(&request.run_id)
        .with_artifact("jobId", result["jobid"].clone())
        .with_artifact("jobName", result["jobname"].clone())
        .with_artifact("returnCode", result["retcode"].clone())
        .with_log(format!("Job {} submitted to z/OS", value_text(&result["jobid"])))
        .with_metadata("connector", CONNECTOR)
        .with_metadata("stubbed", false),
    )
  }

  async fn read(
    &self,
    backend: &Backend,
    request: &ConnectorRequest,
    action: ZosAction,
  ) -> Result<ConnectorResponse, CallError> {
    let dataset = request.require_str("dataset")?;
    let url = endpoint_url(
      &backend.endpoint,
      &format!("/zosmf/restfiles/ds/{}", dataset),
    )?;
    let content = self.transport.get_text(&url, Some(&backend.auth)).await?;

    let response = ConnectorResponse::success(&request.run_id);
    let response = match action {
      ZosAction::Smf => response
        .with_artifact("smfRecords", content)
        .with_log(format!("Fetched SMF data from {}", dataset)),
      _ => response
        .with_artifact("content", content)
        .with_log(format!("Read dataset {}", dataset)),
    };
    Ok(
      response
        .with_metadata("connector", CONNECTOR)
        .with_metadata("stubbed", false),
    )
  }
}

#[async_trait]
impl Connector for ZosConnector {
  #[instrument(
    name = "zos_execute",
    skip(self, request),
    fields(run_id = %request.run_id, node_type = %request.node_type)
  )]
  async fn execute(&self, request: ConnectorRequest) -> Result<ConnectorResponse, ConnectorError> {
    let Some(action) = ZosAction::parse(request.action()) else {
      warn!(connector = CONNECTOR, action = %request.action(), "connector_unknown_action");
      return Ok(
        ConnectorResponse::unknown_action(&request.run_id, "z/OS", request.action())
          .with_metadata("connector", CONNECTOR),
      );
    };

    let Some(backend) = &self.backend else {
      info!(connector = CONNECTOR, reason = NOT_CONFIGURED, "connector_stubbed");
      return Ok(stub(&request.run_id, NOT_CONFIGURED));
    };

    let result = match action {
      ZosAction::Submit => self.submit(backend, &request).await,
      ZosAction::Smf | ZosAction::Dataset => self.read(backend, &request, action).await,
    };

    match result {
      Ok(response) => Ok(response),
      Err(CallError::Input(e)) => Err(e),
      Err(CallError::Transport(e)) if action == ZosAction::Submit => {
        error!(connector = CONNECTOR, error = %e, "zos_submit_failed");
        Ok(
          ConnectorResponse::fail(&request.run_id)
            .with_log(format!("z/OS submission error: {}", e))
            .with_metadata("connector", CONNECTOR),
        )
      }
      Err(CallError::Transport(e)) => {
        warn!(connector = CONNECTOR, error = %e, "connector_stubbed");
        Ok(stub(&request.run_id, &e.to_string()))
      }
    }
  }

  fn is_available(&self) -> bool {
    self.backend.is_some()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fake::FakeTransport;
  use flowasm_config::ConfigMap;
  use serde_json::{Value, json};

  const ENDPOINT: &str = "https://zos.test:443";

  fn configured() -> ZosSettings {
    ZosSettings {
      endpoint: Some(ENDPOINT.to_string()),
      username: Some("IBMUSER".to_string()),
      password: Some("SYS1".to_string()),
    }
  }

  fn request(node_type: &str, inputs: Value) -> ConnectorRequest {
    ConnectorRequest {
      run_id: "zos-run".to_string(),
      node_type: node_type.to_string(),
      inputs: inputs.as_object().cloned().unwrap_or_default(),
      meta: ConfigMap::new(),
    }
  }

  #[tokio::test]
  async fn test_partial_credentials_stub() {
    let settings = ZosSettings {
      password: None,
      ..configured()
    };
    let connector = ZosConnector::new(settings, Arc::new(FakeTransport::new()));
    assert!(!connector.is_available());

    let response = connector
      .execute(request("zos.submit", json!({ "jcl": "//JOB" })))
      .await
      .unwrap();

    assert!(response.is_success());
    assert!(response.is_stubbed());
    assert_eq!(response.artifacts["message"], "z/OS connector not configured");
    assert_eq!(response.artifacts["reason"], NOT_CONFIGURED);
    assert_eq!(response.logs.len(), 3);
    assert_eq!(
      response.logs[0],
      "[STUBBED] z/OS operation (credentials not configured)"
    );
  }

  #[tokio::test]
  async fn test_unknown_action() {
    let connector = ZosConnector::new(ZosSettings::default(), Arc::new(FakeTransport::new()));
    let response = connector.execute(request("zos.cancel", json!({}))).await.unwrap();

    assert!(!response.is_success());
    assert_eq!(response.logs, vec!["Unknown z/OS action: cancel"]);
    assert_eq!(response.metadata["connector"], "zos");
  }

  #[tokio::test]
  async fn test_submit_uses_basic_auth() {
    let transport = Arc::new(FakeTransport::new().route(
      "PUT",
      &format!("{}/zosmf/restjobs/jobs", ENDPOINT),
      json!({ "jobid": "JOB01234", "jobname": "PAYROLL", "retcode": "CC 0000" }),
    ));
    let connector = ZosConnector::new(configured(), transport.clone());

    let response = connector
      .execute(request("zos.submit", json!({ "jcl": "//PAYROLL JOB" })))
      .await
      .unwrap();

    assert!(response.is_success());
    assert!(!response.is_stubbed());
    assert_eq!(response.artifacts["jobId"], "JOB01234");
    assert_eq!(response.artifacts["jobName"], "PAYROLL");
    assert_eq!(response.artifacts["returnCode"], "CC 0000");
    assert_eq!(response.logs, vec!["Job JOB01234 submitted to z/OS"]);

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].body, Some(json!("//PAYROLL JOB")));
    assert_eq!(calls[0].auth, Some(BasicAuth::new("IBMUSER", "SYS1")));
  }

  #[tokio::test]
  async fn test_submit_error_fails() {
    let connector = ZosConnector::new(configured(), Arc::new(FakeTransport::new()));

    let response = connector
      .execute(request("zos.submit", json!({ "jcl": "//PAYROLL JOB" })))
      .await
      .unwrap();

    assert!(!response.is_success());
    assert!(!response.is_stubbed());
    assert!(response.logs[0].starts_with("z/OS submission error: "));
  }

  #[tokio::test]
  async fn test_dataset_read() {
    let transport = Arc::new(FakeTransport::new().route(
      "GET",
      &format!("{}/zosmf/restfiles/ds/PAYROLL.MASTER", ENDPOINT),
      json!("EMP001 40 25\n"),
    ));
    let connector = ZosConnector::new(configured(), transport);

    let response = connector
      .execute(request("zos.dataset", json!({ "dataset": "PAYROLL.MASTER" })))
      .await
      .unwrap();

    assert_eq!(response.artifacts["content"], "EMP001 40 25\n");
    assert_eq!(response.logs, vec!["Read dataset PAYROLL.MASTER"]);
  }

  #[tokio::test]
  async fn test_smf_error_degrades_to_stub() {
    let connector = ZosConnector::new(configured(), Arc::new(FakeTransport::new()));

    let response = connector
      .execute(request("zos.smf", json!({ "dataset": "SYS1.MAN1" })))
      .await
      .unwrap();

    assert!(response.is_success());
    assert!(response.is_stubbed());
    assert!(
      response.artifacts["reason"]
        .as_str()
        .unwrap()
        .contains("connection refused")
    );
  }
}
