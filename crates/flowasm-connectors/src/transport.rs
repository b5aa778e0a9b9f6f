//! The HTTP seam between connectors and their backends.
//!
//! Connectors never talk to `reqwest` directly; they go through a
//! [`Transport`], so tests can swap in an in-memory backend.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use url::Url;

use crate::error::TransportError;

/// HTTP basic credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
  pub username: String,
  pub password: String,
}

impl BasicAuth {
  pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
    Self {
      username: username.into(),
      password: password.into(),
    }
  }
}

impl fmt::Debug for BasicAuth {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BasicAuth")
      .field("username", &self.username)
      .field("password", &"<redacted>")
      .finish()
  }
}

#[async_trait]
pub trait Transport: Send + Sync {
  async fn get_json(&self, url: &str, auth: Option<&BasicAuth>) -> Result<Value, TransportError>;

  async fn get_text(&self, url: &str, auth: Option<&BasicAuth>) -> Result<String, TransportError>;

  async fn post_json(&self, url: &str, body: &Value) -> Result<Value, TransportError>;

  /// Send a `text/plain` body with `PUT`, expecting JSON back.
  async fn put_text(
    &self,
    url: &str,
    body: String,
    auth: Option<&BasicAuth>,
  ) -> Result<Value, TransportError>;
}

/// Join an endpoint and a path into a validated absolute URL.
pub fn endpoint_url(endpoint: &str, path: &str) -> Result<String, TransportError> {
  let joined = format!("{}{}", endpoint.trim_end_matches('/'), path);
  Url::parse(&joined)
    .map(String::from)
    .map_err(|e| TransportError::InvalidUrl {
      url: joined,
      message: e.to_string(),
    })
}

/// Upper bound on a single backend request when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`Transport`] backed by a shared `reqwest` client.
///
/// Every request carries a timeout covering connect, send and the response
/// body, so a stalled backend surfaces as [`TransportError::Timeout`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
  client: Client,
  timeout: Duration,
}

impl HttpTransport {
  pub fn new() -> Self {
    Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
  }

  pub fn with_timeout(timeout: Duration) -> Self {
    Self::with_client(Client::new(), timeout)
  }

  pub fn with_client(client: Client, timeout: Duration) -> Self {
    Self { client, timeout }
  }

  pub fn timeout(&self) -> Duration {
    self.timeout
  }

  async fn send(
    &self,
    url: &str,
    request: RequestBuilder,
    auth: Option<&BasicAuth>,
  ) -> Result<Response, TransportError> {
    let request = match auth {
      Some(auth) => request.basic_auth(&auth.username, Some(&auth.password)),
      None => request,
    };

    let response = request
      .timeout(self.timeout)
      .send()
      .await
      .map_err(|e| self.request_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
      return Err(TransportError::Status {
        url: url.to_string(),
        status: status.as_u16(),
      });
    }
    Ok(response)
  }

  async fn read_json(&self, url: &str, response: Response) -> Result<Value, TransportError> {
    response.json().await.map_err(|e| self.body_error(url, e))
  }

  fn request_error(&self, url: &str, error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
      return self.timeout_error(url);
    }
    TransportError::Request {
      url: url.to_string(),
      message: error.to_string(),
    }
  }

  fn body_error(&self, url: &str, error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
      return self.timeout_error(url);
    }
    TransportError::Decode {
      url: url.to_string(),
      message: error.to_string(),
    }
  }

  fn timeout_error(&self, url: &str) -> TransportError {
    TransportError::Timeout {
      url: url.to_string(),
      timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
    }
  }
}

impl Default for HttpTransport {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl Transport for HttpTransport {
  async fn get_json(&self, url: &str, auth: Option<&BasicAuth>) -> Result<Value, TransportError> {
    let response = self.send(url, self.client.get(url), auth).await?;
    self.read_json(url, response).await
  }

  async fn get_text(&self, url: &str, auth: Option<&BasicAuth>) -> Result<String, TransportError> {
    let response = self.send(url, self.client.get(url), auth).await?;
    response.text().await.map_err(|e| self.body_error(url, e))
  }

  async fn post_json(&self, url: &str, body: &Value) -> Result<Value, TransportError> {
    let response = self.send(url, self.client.post(url).json(body), None).await?;
    self.read_json(url, response).await
  }

  async fn put_text(
    &self,
    url: &str,
    body: String,
    auth: Option<&BasicAuth>,
  ) -> Result<Value, TransportError> {
    let request = self
      .client
      .put(url)
      .header(reqwest::header::CONTENT_TYPE, "text/plain")
      .body(body);
    let response = self.send(url, request, auth).await?;
    self.read_json(url, response).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_endpoint_url() {
    assert_eq!(
      endpoint_url("http://localhost:8038/", "/api/status").unwrap(),
      "http://localhost:8038/api/status"
    );
    assert!(matches!(
      endpoint_url("not a url", "/api/status"),
      Err(TransportError::InvalidUrl { .. })
    ));
  }

  #[test]
  fn test_basic_auth_debug_redacts_password() {
    let debug = format!("{:?}", BasicAuth::new("IBMUSER", "SYS1"));
    assert!(debug.contains("IBMUSER"));
    assert!(!debug.contains("SYS1"));
  }

  #[tokio::test]
  async fn test_unreachable_backend_is_request_error() {
    // Port 9 (discard) on localhost is not expected to serve HTTP.
    let transport = HttpTransport::new();
    let err = transport
      .get_text("http://127.0.0.1:9/api/status", None)
      .await
      .unwrap_err();
    assert!(matches!(err, TransportError::Request { .. }));
  }

  #[tokio::test]
  async fn test_request_timeout_is_reported() {
    // Accepts the connection but never answers.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/api/3270/screen", listener.local_addr().unwrap());
    let server = tokio::spawn(async move {
      let (socket, _) = listener.accept().await.unwrap();
      std::future::pending::<()>().await;
      drop(socket);
    });

    let transport = HttpTransport::with_timeout(Duration::from_millis(200));
    let err = transport.get_json(&url, None).await.unwrap_err();

    assert!(
      matches!(err, TransportError::Timeout { timeout_ms: 200, .. }),
      "unexpected error: {}",
      err
    );
    server.abort();
  }

  #[test]
  fn test_default_timeout() {
    assert_eq!(HttpTransport::new().timeout(), DEFAULT_REQUEST_TIMEOUT);
  }
}
