//! FlowASM Config
//!
//! This crate contains the serializable configuration types for FlowASM:
//! workflow definitions as authored (by hand, by the visual builder, or in an
//! API request body) and the settings that point remote connectors at their
//! backends.
//!
//! Workflow definitions are plain JSON:
//!
//! ```json
//! {
//!   "id": "demo",
//!   "name": "Compile and run",
//!   "nodes": [
//!     { "id": "c", "type": "asm.compile", "config": { "sourceCode": "HLT" } },
//!     { "id": "r", "type": "asm.run", "config": { "bytecode": "{{node.c.artifacts.bytecode}}" } }
//!   ],
//!   "connections": [{ "from": "c", "to": "r" }]
//! }
//! ```

mod edge;
mod error;
mod input;
mod node;
mod settings;
mod workflow;

pub use edge::Edge;
pub use error::ConfigError;
pub use input::ConfigMap;
pub use node::{NodeDef, split_node_type};
pub use settings::{
  ConnectorSettings, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_TK5_ENDPOINT, Tk5Settings, ZeroFrameSettings,
  ZosSettings,
};
pub use workflow::WorkflowDef;
