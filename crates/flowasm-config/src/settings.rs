//! Connector settings.
//!
//! Each remote connector reads its endpoint (and, for z/OS, credentials) from
//! explicit settings, falling back to environment variables:
//!
//! | connector   | variables                                    |
//! |-------------|----------------------------------------------|
//! | `tk5`       | `TK5_ENDPOINT`                               |
//! | `zos`       | `ZOS_ENDPOINT`, `ZOS_USERNAME`, `ZOS_PASSWORD` |
//! | `zeroframe` | `ZEROFRAME_ENDPOINT`                         |
//! | all         | `CONNECTOR_TIMEOUT_MS` (per request)         |
//!
//! A connector with missing settings still runs; it degrades to stubbed
//! responses.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_TK5_ENDPOINT: &str = "http://localhost:8038";

/// Settings for the TK5/Hercules emulator connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tk5Settings {
  pub endpoint: String,
  /// Timeout for the availability probe.
  pub probe_timeout_ms: u64,
}

impl Default for Tk5Settings {
  fn default() -> Self {
    Self {
      endpoint: DEFAULT_TK5_ENDPOINT.to_string(),
      probe_timeout_ms: 2000,
    }
  }
}

/// Settings for the z/OS connector.
#[derive(Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZosSettings {
  pub endpoint: Option<String>,
  pub username: Option<String>,
  pub password: Option<String>,
}

impl ZosSettings {
  /// All of endpoint, username and password are present.
  pub fn is_configured(&self) -> bool {
    self.endpoint.is_some() && self.username.is_some() && self.password.is_some()
  }
}

impl fmt::Debug for ZosSettings {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ZosSettings")
      .field("endpoint", &self.endpoint)
      .field("username", &self.username)
      .field("password", &self.password.as_ref().map(|_| "<redacted>"))
      .finish()
  }
}

/// Settings for the ZeroFrame 3270 terminal connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZeroFrameSettings {
  pub endpoint: Option<String>,
  /// Delay between screen polls while waiting for text.
  pub poll_interval_ms: u64,
}

impl Default for ZeroFrameSettings {
  fn default() -> Self {
    Self {
      endpoint: None,
      poll_interval_ms: 500,
    }
  }
}

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Settings for every remote connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorSettings {
  pub tk5: Tk5Settings,
  pub zos: ZosSettings,
  pub zeroframe: ZeroFrameSettings,
  /// Upper bound on any single backend HTTP request.
  pub request_timeout_ms: u64,
}

impl Default for ConnectorSettings {
  fn default() -> Self {
    Self {
      tk5: Tk5Settings::default(),
      zos: ZosSettings::default(),
      zeroframe: ZeroFrameSettings::default(),
      request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
    }
  }
}

impl ConnectorSettings {
  /// Build settings from process environment variables.
  pub fn from_env() -> Self {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Build settings from an arbitrary variable lookup.
  ///
  /// Empty values are treated as unset.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let mut settings = Self::default();
    if let Some(endpoint) = var("TK5_ENDPOINT") {
      settings.tk5.endpoint = endpoint;
    }
    settings.zos.endpoint = var("ZOS_ENDPOINT");
    settings.zos.username = var("ZOS_USERNAME");
    settings.zos.password = var("ZOS_PASSWORD");
    settings.zeroframe.endpoint = var("ZEROFRAME_ENDPOINT");
    if let Some(ms) = var("CONNECTOR_TIMEOUT_MS").and_then(|v| v.trim().parse().ok()) {
      settings.request_timeout_ms = ms;
    }
    settings
  }

  /// Parse settings from JSON. Missing sections take their defaults.
  pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
    Ok(serde_json::from_str(content)?)
  }

  /// Check that every configured endpoint is an absolute http(s) URL.
  pub fn validate(&self) -> Result<(), ConfigError> {
    validate_endpoint("tk5", &self.tk5.endpoint)?;
    if let Some(endpoint) = &self.zos.endpoint {
      validate_endpoint("zos", endpoint)?;
    }
    if let Some(endpoint) = &self.zeroframe.endpoint {
      validate_endpoint("zeroframe", endpoint)?;
    }
    Ok(())
  }

  /// Unset every optional endpoint that fails validation, so its connector
  /// stubs instead of calling a malformed URL. Returns what was wrong.
  ///
  /// The TK5 endpoint is always set; an invalid one fails the availability
  /// probe and stubs the same way.
  pub fn discard_invalid_endpoints(&mut self) -> Vec<ConfigError> {
    let mut errors = Vec::new();
    if let Err(e) = validate_endpoint("tk5", &self.tk5.endpoint) {
      errors.push(e);
    }

    let optional = [
      ("zos", &mut self.zos.endpoint),
      ("zeroframe", &mut self.zeroframe.endpoint),
    ];
    for (connector, endpoint) in optional {
      let invalid = endpoint
        .as_deref()
        .and_then(|url| validate_endpoint(connector, url).err());
      if let Some(e) = invalid {
        errors.push(e);
        *endpoint = None;
      }
    }
    errors
  }
}

fn validate_endpoint(connector: &str, endpoint: &str) -> Result<(), ConfigError> {
  let url = Url::parse(endpoint).map_err(|e| ConfigError::InvalidEndpoint {
    connector: connector.to_string(),
    message: format!("'{}': {}", endpoint, e),
  })?;

  match url.scheme() {
    "http" | "https" => Ok(()),
    other => Err(ConfigError::InvalidEndpoint {
      connector: connector.to_string(),
      message: format!("unsupported scheme '{}'", other),
    }),
  }
}
