//! FlowASM Connector
//!
//! The contract between the workflow engine and its backends. Every backend
//! (the local assembly sandbox as well as the remote mainframe connectors)
//! implements [`Connector`]; the engine looks connectors up by name in a
//! [`ConnectorRegistry`] and exchanges [`ConnectorRequest`] /
//! [`ConnectorResponse`] values with them.
//!
//! Wire format:
//!
//! ```text
//! request  { run_id, node_type, inputs, meta }
//! response { run_id, status: "SUCCESS" | "FAIL", artifacts, logs, metadata }
//! ```

mod connector;
mod error;
mod registry;
mod types;

pub use connector::Connector;
pub use error::ConnectorError;
pub use registry::ConnectorRegistry;
pub use types::{ConnectorRequest, ConnectorResponse, ConnectorStatus};
