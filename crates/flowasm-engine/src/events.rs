//! Execution events and notifiers.
//!
//! The engine emits an event at every run and node transition so callers can
//! stream progress (to a UI, a log, a test) without waiting for the
//! [`RunResult`](crate::RunResult).

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::result::{NodeResult, RunStatus};

/// Events emitted during a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
  WorkflowStarted {
    execution_id: String,
    workflow_id: String,
  },

  NodeStarted {
    execution_id: String,
    node_id: String,
    node_type: String,
  },

  /// The node succeeded; carries its full result.
  NodeCompleted {
    execution_id: String,
    result: NodeResult,
  },

  /// The node failed; the run stops after this event.
  NodeFailed {
    execution_id: String,
    result: NodeResult,
    error: String,
  },

  WorkflowCompleted {
    execution_id: String,
    duration_ms: u64,
  },

  /// The run ended with status `FAILED` or `ERROR`.
  WorkflowFailed {
    execution_id: String,
    status: RunStatus,
    error: String,
  },
}

/// Receives execution events.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// Discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// Forwards events to an unbounded channel. A slow consumer never blocks
/// the engine.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }

  /// Create a notifier together with its receiving end.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // The receiver may have been dropped.
    let _ = self.sender.send(event);
  }
}
