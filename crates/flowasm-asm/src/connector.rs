//! The `asm` connector: compile, run and debug sandbox programs.

use async_trait::async_trait;
use flowasm_connector::{Connector, ConnectorError, ConnectorRequest, ConnectorResponse};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::assembler::assemble;
use crate::bytecode::Bytecode;
use crate::error::SandboxError;
use crate::vm::Machine;

const ENGINE: &str = "asm-sandbox";

/// Actions understood by the sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsmAction {
  Compile,
  Run,
  Debug,
}

impl AsmAction {
  pub fn parse(action: &str) -> Option<Self> {
    match action {
      "compile" => Some(Self::Compile),
      "run" => Some(Self::Run),
      "debug" => Some(Self::Debug),
      _ => None,
    }
  }

  fn failure_prefix(self) -> &'static str {
    match self {
      Self::Compile => "Compilation error",
      Self::Run => "Execution error",
      Self::Debug => "Debug error",
    }
  }
}

/// Local assembler and virtual machine. Always available.
///
/// Every invocation builds its own [`Machine`], so concurrent nodes never
/// observe each other's registers.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsmSandboxConnector;

impl AsmSandboxConnector {
  pub fn new() -> Self {
    Self
  }

  fn compile(&self, request: &ConnectorRequest) -> Result<ConnectorResponse, SandboxError> {
    let source = match request.input_str("sourceCode") {
      Some(source) => source,
      None => request
        .input_str("code")
        .ok_or_else(|| ConnectorError::MissingInput {
          field: "sourceCode".to_string(),
        })?,
    };

    let program = assemble(source)?;
    let instructions = program.instruction_count();

    Ok(
      ConnectorResponse::success(&request.run_id)
        .with_artifact("bytecode", program.bytecode().to_string())
        .with_artifact("instructions", instructions)
        .with_artifact("labels", serde_json::to_value(&program.labels)?)
        .with_log(format!("Compiled {} instructions", instructions)),
    )
  }

  fn run(&self, request: &ConnectorRequest) -> Result<ConnectorResponse, SandboxError> {
    let bytecode = bytecode_input(request)?;
    let report = Machine::new().execute(bytecode.as_slice());

    let logs = if report.logs.is_empty() {
      vec![format!("Executed {} cycles without HLT", report.cycles)]
    } else {
      report.logs.clone()
    };

    Ok(
      ConnectorResponse::success(&request.run_id)
        .with_artifact("registers", serde_json::to_value(report.registers)?)
        .with_artifact("output", report.output)
        .with_artifact("exitCode", report.exit_code)
        .with_logs(logs)
        .with_metadata("cycles", report.cycles),
    )
  }

  fn debug(&self, request: &ConnectorRequest) -> Result<ConnectorResponse, SandboxError> {
    let bytecode = bytecode_input(request)?;
    let breakpoints = breakpoints_input(request)?;
    let report = Machine::new().debug(bytecode.as_slice(), &breakpoints);

    Ok(
      ConnectorResponse::success(&request.run_id)
        .with_artifact("breakpointsHit", serde_json::to_value(&report.breakpoints_hit)?)
        .with_artifact("stepsExecuted", report.steps_executed)
        .with_artifact("finalState", serde_json::to_value(&report.final_state)?)
        .with_log("Debug session completed"),
    )
  }
}

fn bytecode_input(request: &ConnectorRequest) -> Result<Bytecode, SandboxError> {
  let value = request
    .inputs
    .get("bytecode")
    .ok_or_else(|| ConnectorError::MissingInput {
      field: "bytecode".to_string(),
    })?;
  Ok(Bytecode::from_value(value)?)
}

fn breakpoints_input(request: &ConnectorRequest) -> Result<Vec<usize>, SandboxError> {
  match request.inputs.get("breakpoints") {
    None | Some(Value::Null) => Ok(Vec::new()),
    Some(Value::Array(items)) => items
      .iter()
      .map(|item| {
        item
          .as_u64()
          .and_then(|n| usize::try_from(n).ok())
          .ok_or_else(|| invalid_breakpoints(format!("expected non-negative integer, got {}", item)))
      })
      .collect(),
    Some(other) => Err(invalid_breakpoints(format!("expected array, got {}", other))),
  }
}

fn invalid_breakpoints(message: String) -> SandboxError {
  SandboxError::Input(ConnectorError::InvalidInput {
    field: "breakpoints".to_string(),
    message,
  })
}

#[async_trait]
impl Connector for AsmSandboxConnector {
  #[instrument(
    name = "asm_execute",
    skip(self, request),
    fields(run_id = %request.run_id, node_type = %request.node_type)
  )]
  async fn execute(&self, request: ConnectorRequest) -> Result<ConnectorResponse, ConnectorError> {
    let Some(action) = AsmAction::parse(request.action()) else {
      warn!(action = %request.action(), "asm_unknown_action");
      return Ok(
        ConnectorResponse::unknown_action(&request.run_id, "asm", request.action())
          .with_metadata("engine", ENGINE),
      );
    };

    let result = match action {
      AsmAction::Compile => self.compile(&request),
      AsmAction::Run => self.run(&request),
      AsmAction::Debug => self.debug(&request),
    };

    let response = match result {
      Ok(response) => response,
      Err(e) => {
        warn!(error = %e, "asm_action_failed");
        ConnectorResponse::fail(&request.run_id)
          .with_log(format!("{}: {}", action.failure_prefix(), e))
      }
    };

    info!(status = ?response.status, "asm_action_completed");
    Ok(
      response
        .with_metadata("engine", ENGINE)
        .with_metadata("stubbed", false),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use flowasm_config::ConfigMap;
  use serde_json::json;

  fn request(node_type: &str, inputs: Value) -> ConnectorRequest {
    ConnectorRequest {
      run_id: "run-1".to_string(),
      node_type: node_type.to_string(),
      inputs: inputs.as_object().cloned().unwrap_or_default(),
      meta: ConfigMap::new(),
    }
  }

  #[test]
  fn test_action_parse() {
    assert_eq!(AsmAction::parse("compile"), Some(AsmAction::Compile));
    assert_eq!(AsmAction::parse("debug"), Some(AsmAction::Debug));
    assert_eq!(AsmAction::parse("Compile"), None);
  }

  #[tokio::test]
  async fn test_compile_accepts_code_alias() {
    let response = AsmSandboxConnector::new()
      .execute(request("asm.compile", json!({ "code": "HLT" })))
      .await
      .unwrap();

    assert!(response.is_success());
    assert_eq!(response.artifacts["bytecode"], "255");
  }

  #[tokio::test]
  async fn test_compile_without_source_fails() {
    let response = AsmSandboxConnector::new()
      .execute(request("asm.compile", json!({})))
      .await
      .unwrap();

    assert!(!response.is_success());
    assert!(response.logs[0].starts_with("Compilation error: "));
    assert!(response.logs[0].contains("sourceCode"));
  }

  #[tokio::test]
  async fn test_run_without_halt_reports_cycles() {
    let response = AsmSandboxConnector::new()
      .execute(request("asm.run", json!({ "bytecode": "1,2,3" })))
      .await
      .unwrap();

    assert!(response.is_success());
    assert_eq!(response.artifacts["exitCode"], 1);
    assert_eq!(response.logs, vec!["Executed 3 cycles without HLT"]);
    assert_eq!(response.metadata["cycles"], 3);
  }

  #[tokio::test]
  async fn test_invalid_breakpoints_fail() {
    let response = AsmSandboxConnector::new()
      .execute(request(
        "asm.debug",
        json!({ "bytecode": "255", "breakpoints": "0" }),
      ))
      .await
      .unwrap();

    assert!(!response.is_success());
    assert!(response.logs[0].starts_with("Debug error: "));
  }

  #[tokio::test]
  async fn test_out_of_range_breakpoints_fail() {
    for breakpoints in [json!([0, -1]), json!([1.5]), json!(["2"])] {
      let response = AsmSandboxConnector::new()
        .execute(request(
          "asm.debug",
          json!({ "bytecode": "1,255", "breakpoints": breakpoints }),
        ))
        .await
        .unwrap();

      assert!(!response.is_success());
      assert!(
        response.logs[0].contains("expected non-negative integer"),
        "unexpected log: {}",
        response.logs[0]
      );
    }
  }

  #[tokio::test]
  async fn test_unknown_action() {
    let response = AsmSandboxConnector::new()
      .execute(request("asm.link", json!({})))
      .await
      .unwrap();

    assert!(!response.is_success());
    assert_eq!(response.logs, vec!["Unknown asm action: link"]);
    assert_eq!(response.metadata["engine"], "asm-sandbox");
  }
}
