//! FlowASM Workflow Engine
//!
//! Runs workflows against a registry of connectors.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      WorkflowRunner                         │
//! │  - registers connectors, catalogs workflows                 │
//! │  - execute_workflow(id) / execute(def)                      │
//! │  - connector health (UP / STUBBED)                          │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       FlowEngine                            │
//! │  - execute(workflow) → RunResult                            │
//! │  - strictly sequential, halts at the first failed node      │
//! │  - {{node.<id>.<path>}} resolution before each dispatch     │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Connector                             │
//! │  - asm (local sandbox), tk5, zos, zeroframe                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use flowasm_config::{ConnectorSettings, WorkflowDef};
//! use flowasm_engine::WorkflowRunner;
//!
//! let mut runner = WorkflowRunner::with_default_connectors(&ConnectorSettings::from_env()).await;
//! let workflow = WorkflowDef::from_file("workflows/payroll-demo.json").await?;
//! let result = runner.execute(&workflow).await;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! ```

mod engine;
mod error;
mod events;
mod result;
mod runner;
mod template;

pub use engine::{FlowEngine, NodeOutcome};
pub use error::{EngineError, RunnerError};
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use result::{NodeResult, RunResult, RunStatus};
pub use runner::{ConnectorHealth, HealthReport, WorkflowRunner, WorkflowSummary};
pub use template::{TemplateRef, resolve_config, resolve_str};
