//! FlowASM remote connectors.
//!
//! Mainframe backends reached over HTTP:
//!
//! - [`Tk5Connector`] (`tk5.submit`, `tk5.ipl`, `tk5.status`): a local
//!   TK5/Hercules emulator
//! - [`ZosConnector`] (`zos.submit`, `zos.smf`, `zos.dataset`): z/OSMF
//! - [`ZeroFrameConnector`] (`zeroframe.send`, `zeroframe.read`,
//!   `zeroframe.wait`): 3270 terminal automation
//!
//! Each connector degrades to synthetic, `stubbed` responses when its backend
//! is missing or unreachable, so workflows can run end to end on a laptop.

mod error;
#[cfg(test)]
mod fake;
mod tk5;
mod transport;
mod zeroframe;
mod zos;

pub use error::TransportError;
pub use tk5::{Tk5Action, Tk5Connector};
pub use transport::{BasicAuth, DEFAULT_REQUEST_TIMEOUT, HttpTransport, Transport, endpoint_url};
pub use zeroframe::{ZeroFrameAction, ZeroFrameConnector};
pub use zos::{ZosAction, ZosConnector};

/// Render a JSON value for a log line: strings without quotes, the rest as JSON.
pub(crate) fn value_text(value: &serde_json::Value) -> String {
  match value {
    serde_json::Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}
