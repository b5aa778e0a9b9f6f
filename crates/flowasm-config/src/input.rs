//! Node configuration values.
//!
//! A node's `config` is a JSON object. String values may embed template
//! references to the results of earlier nodes in the same run:
//!
//! ```json
//! {
//!   "sourceCode": ".TEXT\nmain:\n  MOV R0,#42\n  HLT",
//!   "bytecode": "{{node.compile.artifacts.bytecode}}",
//!   "jobName": "PAYROLL-{{node.submit.artifacts.jobId}}"
//! }
//! ```
//!
//! References are resolved by the engine right before the node is dispatched
//! to its connector. Non-string values are passed through untouched.

/// Configuration of a single node, keyed by input name.
pub type ConfigMap = serde_json::Map<String, serde_json::Value>;
