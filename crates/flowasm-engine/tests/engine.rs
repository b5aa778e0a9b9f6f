//! Integration tests for FlowEngine control flow, template threading and events.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use flowasm_asm::AsmSandboxConnector;
use flowasm_config::WorkflowDef;
use flowasm_connector::{
  Connector, ConnectorError, ConnectorRegistry, ConnectorRequest, ConnectorResponse,
};
use flowasm_engine::{ChannelNotifier, ExecutionEvent, FlowEngine, RunStatus};
use serde_json::{Value, json};

/// Succeeds or fails depending on its `outcome` input and counts calls.
#[derive(Default)]
struct Scripted {
  calls: AtomicUsize,
}

#[async_trait]
impl Connector for Scripted {
  async fn execute(&self, request: ConnectorRequest) -> Result<ConnectorResponse, ConnectorError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let outcome = request.input_str("outcome").map(str::to_string);
    match outcome.as_deref() {
      Some("fail") => Ok(ConnectorResponse::fail(request.run_id).with_log("scripted failure")),
      Some("error") => Err(ConnectorError::Backend {
        message: "socket closed".to_string(),
      }),
      Some("panic") => panic!("scripted panic"),
      _ => Ok(
        ConnectorResponse::success(request.run_id.clone())
          .with_artifact("echo", Value::Object(request.inputs.clone()))
          .with_artifact("runId", request.run_id)
          .with_metadata("meta", Value::Object(request.meta)),
      ),
    }
  }
}

/// Never answers; records when its in-flight call is dropped.
#[derive(Default)]
struct Hanging {
  dropped: Arc<AtomicBool>,
}

struct SetOnDrop(Arc<AtomicBool>);

impl Drop for SetOnDrop {
  fn drop(&mut self) {
    self.0.store(true, Ordering::SeqCst);
  }
}

#[async_trait]
impl Connector for Hanging {
  async fn execute(&self, _request: ConnectorRequest) -> Result<ConnectorResponse, ConnectorError> {
    let _guard = SetOnDrop(self.dropped.clone());
    std::future::pending().await
  }
}

fn workflow(nodes: Value) -> WorkflowDef {
  serde_json::from_value(json!({ "id": "test", "name": "Test", "nodes": nodes })).unwrap()
}

fn engine_with(scripted: Arc<Scripted>) -> FlowEngine {
  let registry = ConnectorRegistry::new()
    .with("asm", Arc::new(AsmSandboxConnector::new()))
    .with("script", scripted);
  FlowEngine::new(Arc::new(registry))
}

#[tokio::test]
async fn test_halts_at_first_failure() {
  let scripted = Arc::new(Scripted::default());
  let engine = engine_with(scripted.clone());

  let run = engine
    .execute(&workflow(json!([
      { "id": "a", "type": "script.step", "config": {} },
      { "id": "b", "type": "script.step", "config": { "outcome": "fail" } },
      { "id": "c", "type": "script.step", "config": {} }
    ])))
    .await;

  assert_eq!(run.status, RunStatus::Failed);
  let ids: Vec<&str> = run.nodes.iter().map(|n| n.id.as_str()).collect();
  assert_eq!(ids, vec!["a", "b"]);
  assert!(run.nodes[0].success);
  assert!(!run.nodes[1].success);
  assert!(run.nodes[1].error.is_none());
  assert_eq!(run.logs, vec!["Node b failed: scripted failure"]);
  assert_eq!(scripted.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_connector_error_is_node_failure() {
  let engine = engine_with(Arc::new(Scripted::default()));

  let run = engine
    .execute(&workflow(json!([
      { "id": "a", "type": "script.step", "config": { "outcome": "error" } }
    ])))
    .await;

  assert_eq!(run.status, RunStatus::Failed);
  let node = &run.nodes[0];
  assert!(!node.success);
  let error = node.error.as_deref().unwrap();
  assert!(error.contains("socket closed"), "unexpected error: {}", error);
  assert_eq!(node.logs, vec![format!("Error: {}", error)]);
}

#[tokio::test]
async fn test_connector_panic_is_node_failure() {
  let engine = engine_with(Arc::new(Scripted::default()));

  let run = engine
    .execute(&workflow(json!([
      { "id": "ok", "type": "script.step", "config": {} },
      { "id": "boom", "type": "script.step", "config": { "outcome": "panic" } },
      { "id": "never", "type": "script.step", "config": {} }
    ])))
    .await;

  assert_eq!(run.status, RunStatus::Failed);
  assert_eq!(run.nodes.len(), 2);
  assert!(
    run.nodes[1]
      .error
      .as_deref()
      .unwrap()
      .contains("scripted panic")
  );
}

#[tokio::test]
async fn test_all_nodes_run_on_success() {
  let engine = engine_with(Arc::new(Scripted::default()));
  let def = workflow(json!([
    { "id": "a", "type": "script.step", "config": {} },
    { "id": "b", "type": "script.step", "config": {} },
    { "id": "c", "type": "script.step", "config": {} }
  ]));

  let run = engine.execute(&def).await;

  assert_eq!(run.status, RunStatus::Success);
  assert_eq!(run.nodes.len(), def.nodes.len());
  assert!(run.logs.is_empty());
}

#[tokio::test]
async fn test_request_shape() {
  let engine = engine_with(Arc::new(Scripted::default()));

  let run = engine
    .execute(&workflow(json!([
      { "id": "a", "type": "script.step", "config": { "x": 1 } },
      { "id": "b", "type": "script.step", "config": {}, "meta": { "owner": "ops" } }
    ])))
    .await;

  let a = &run.nodes[0];
  let b = &run.nodes[1];
  assert_eq!(a.artifacts["meta"], json!({}));
  assert_eq!(b.artifacts["meta"], json!({ "owner": "ops" }));

  let run_a = a.artifacts["runId"].as_str().unwrap();
  let run_b = b.artifacts["runId"].as_str().unwrap();
  assert!(run_a.starts_with("a_"));
  assert!(run_b.starts_with("b_"));
  assert_ne!(run_a, run_b);
}

#[tokio::test]
async fn test_outputs_thread_into_later_inputs() {
  let engine = engine_with(Arc::new(Scripted::default()));

  let run = engine
    .execute(&workflow(json!([
      { "id": "first", "type": "script.step", "config": { "job": "PAYROLL", "count": 3 } },
      { "id": "second", "type": "script.step", "config": {
        "name": "{{node.first.artifacts.echo.job}}-01",
        "count": "{{node.first.artifacts.echo.count}}",
        "missing": "{{node.nowhere.artifacts.x}}",
        "later": "{{node.third.artifacts.echo}}"
      } },
      { "id": "third", "type": "script.step", "config": {} }
    ])))
    .await;

  assert!(run.is_success());
  let second = run.node("second").unwrap();
  assert_eq!(second.inputs["name"], "PAYROLL-01");
  assert_eq!(second.inputs["count"], 3);
  assert_eq!(second.inputs["missing"], "{{node.nowhere.artifacts.x}}");
  assert_eq!(second.inputs["later"], "{{node.third.artifacts.echo}}");
}

#[tokio::test]
async fn test_compile_then_run_end_to_end() {
  let engine = engine_with(Arc::new(Scripted::default()));

  let run = engine
    .execute(&workflow(json!([
      { "id": "c", "type": "asm.compile", "config": { "sourceCode": "main:\n  MOV R0, R1\n  HLT" } },
      { "id": "r", "type": "asm.run", "config": { "bytecode": "{{node.c.artifacts.bytecode}}" } }
    ])))
    .await;

  assert_eq!(run.status, RunStatus::Success);
  assert_eq!(run.nodes.len(), 2);
  assert_eq!(run.nodes[1].inputs["bytecode"], run.nodes[0].artifacts["bytecode"]);
  assert_eq!(run.nodes[1].artifacts["exitCode"], 0);
}

#[tokio::test]
async fn test_compile_failure_halts_before_run() {
  let engine = engine_with(Arc::new(Scripted::default()));

  let run = engine
    .execute(&workflow(json!([
      { "id": "c", "type": "asm.compile", "config": { "sourceCode": "FOO" } },
      { "id": "r", "type": "asm.run", "config": { "bytecode": "{{node.c.artifacts.bytecode}}" } }
    ])))
    .await;

  assert_eq!(run.status, RunStatus::Failed);
  assert_eq!(run.nodes.len(), 1);
  assert!(run.logs[0].starts_with("Node c failed: Compilation error: unknown instruction: FOO"));
}

#[tokio::test]
async fn test_events_follow_the_run() {
  let registry = ConnectorRegistry::new().with("script", Arc::new(Scripted::default()));
  let (notifier, mut receiver) = ChannelNotifier::channel();
  let engine = FlowEngine::with_notifier(Arc::new(registry), notifier);

  engine
    .execute(&workflow(json!([
      { "id": "a", "type": "script.step", "config": {} },
      { "id": "b", "type": "script.step", "config": { "outcome": "fail" } }
    ])))
    .await;

  let mut events = Vec::new();
  while let Ok(event) = receiver.try_recv() {
    events.push(event);
  }

  assert_eq!(events.len(), 6);
  assert!(matches!(&events[0], ExecutionEvent::WorkflowStarted { workflow_id, .. } if workflow_id == "test"));
  assert!(matches!(&events[1], ExecutionEvent::NodeStarted { node_id, .. } if node_id == "a"));
  assert!(matches!(&events[2], ExecutionEvent::NodeCompleted { result, .. } if result.id == "a"));
  assert!(matches!(&events[3], ExecutionEvent::NodeStarted { node_id, .. } if node_id == "b"));
  assert!(matches!(&events[4], ExecutionEvent::NodeFailed { error, .. } if error == "scripted failure"));
  assert!(matches!(
    &events[5],
    ExecutionEvent::WorkflowFailed { status: RunStatus::Failed, .. }
  ));
}

#[tokio::test]
async fn test_concurrent_runs_share_one_engine() {
  let engine = Arc::new(engine_with(Arc::new(Scripted::default())));
  let def = workflow(json!([
    { "id": "c", "type": "asm.compile", "config": { "sourceCode": "MOV R0, R1\nHLT" } },
    { "id": "r", "type": "asm.run", "config": { "bytecode": "{{node.c.artifacts.bytecode}}" } }
  ]));

  let handles: Vec<_> = (0..8)
    .map(|_| {
      let engine = engine.clone();
      let def = def.clone();
      tokio::spawn(async move { engine.execute(&def).await })
    })
    .collect();

  for handle in handles {
    let run = handle.await.unwrap();
    assert_eq!(run.status, RunStatus::Success);
    assert_eq!(run.nodes[1].artifacts["exitCode"], 0);
  }
}

#[tokio::test]
async fn test_dropping_a_run_cancels_the_connector_call() {
  let hanging = Arc::new(Hanging::default());
  let dropped = hanging.dropped.clone();
  let engine = FlowEngine::new(Arc::new(ConnectorRegistry::new().with("hang", hanging)));
  let def = workflow(json!([{ "id": "h", "type": "hang.forever", "config": {} }]));

  let outcome = tokio::time::timeout(Duration::from_millis(50), engine.execute(&def)).await;
  assert!(outcome.is_err());

  for _ in 0..100 {
    if dropped.load(Ordering::SeqCst) {
      break;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  assert!(dropped.load(Ordering::SeqCst));
}
