//! In-memory [`Transport`] for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;
use crate::transport::{BasicAuth, Transport};

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
  pub method: &'static str,
  pub url: String,
  pub body: Option<Value>,
  pub auth: Option<BasicAuth>,
}

/// Answers requests from canned responses keyed by method and URL.
///
/// Each key holds a queue; the last response repeats once the queue drains.
/// Requests without a route fail as if the backend were unreachable.
#[derive(Default)]
pub struct FakeTransport {
  routes: Mutex<HashMap<(&'static str, String), VecDeque<Value>>>,
  calls: Mutex<Vec<Call>>,
}

impl FakeTransport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn route(self, method: &'static str, url: &str, response: Value) -> Self {
    self
      .routes
      .lock()
      .unwrap()
      .entry((method, url.to_string()))
      .or_default()
      .push_back(response);
    self
  }

  pub fn calls(&self) -> Vec<Call> {
    self.calls.lock().unwrap().clone()
  }

  fn respond(
    &self,
    method: &'static str,
    url: &str,
    body: Option<Value>,
    auth: Option<&BasicAuth>,
  ) -> Result<Value, TransportError> {
    self.calls.lock().unwrap().push(Call {
      method,
      url: url.to_string(),
      body,
      auth: auth.cloned(),
    });

    let mut routes = self.routes.lock().unwrap();
    let queue = routes
      .get_mut(&(method, url.to_string()))
      .ok_or_else(|| TransportError::Request {
        url: url.to_string(),
        message: "connection refused".to_string(),
      })?;
    let response = if queue.len() > 1 {
      queue.pop_front()
    } else {
      queue.front().cloned()
    };
    response.ok_or_else(|| TransportError::Request {
      url: url.to_string(),
      message: "no response".to_string(),
    })
  }
}

#[async_trait]
impl Transport for FakeTransport {
  async fn get_json(&self, url: &str, auth: Option<&BasicAuth>) -> Result<Value, TransportError> {
    self.respond("GET", url, None, auth)
  }

  async fn get_text(&self, url: &str, auth: Option<&BasicAuth>) -> Result<String, TransportError> {
    match self.respond("GET", url, None, auth)? {
      Value::String(text) => Ok(text),
      other => Ok(other.to_string()),
    }
  }

  async fn post_json(&self, url: &str, body: &Value) -> Result<Value, TransportError> {
    self.respond("POST", url, Some(body.clone()), None)
  }

  async fn put_text(
    &self,
    url: &str,
    body: String,
    auth: Option<&BasicAuth>,
  ) -> Result<Value, TransportError> {
    self.respond("PUT", url, Some(Value::String(body)), auth)
  }
}

/// A backend that accepts every request and never answers.
pub struct StalledTransport;

#[async_trait]
impl Transport for StalledTransport {
  async fn get_json(&self, _url: &str, _auth: Option<&BasicAuth>) -> Result<Value, TransportError> {
    std::future::pending().await
  }

  async fn get_text(&self, _url: &str, _auth: Option<&BasicAuth>) -> Result<String, TransportError> {
    std::future::pending().await
  }

  async fn post_json(&self, _url: &str, _body: &Value) -> Result<Value, TransportError> {
    std::future::pending().await
  }

  async fn put_text(
    &self,
    _url: &str,
    _body: String,
    _auth: Option<&BasicAuth>,
  ) -> Result<Value, TransportError> {
    std::future::pending().await
  }
}
