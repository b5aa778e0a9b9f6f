use std::collections::HashMap;
use std::sync::Arc;

use crate::connector::Connector;

/// Connectors keyed by the name used in node types (`"asm"` in `"asm.run"`).
///
/// Populated before any run starts and shared read-only afterwards.
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
  connectors: HashMap<String, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a connector, replacing any previous one with the same name.
  pub fn register(&mut self, name: impl Into<String>, connector: Arc<dyn Connector>) {
    self.connectors.insert(name.into(), connector);
  }

  /// Builder-style [`register`](Self::register).
  pub fn with(mut self, name: impl Into<String>, connector: Arc<dyn Connector>) -> Self {
    self.register(name, connector);
    self
  }

  pub fn get(&self, name: &str) -> Option<Arc<dyn Connector>> {
    self.connectors.get(name).cloned()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.connectors.contains_key(name)
  }

  /// Registered names, sorted.
  pub fn names(&self) -> Vec<&str> {
    let mut names: Vec<&str> = self.connectors.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Connector>)> {
    self.connectors.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn len(&self) -> usize {
    self.connectors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.connectors.is_empty()
  }
}

impl std::fmt::Debug for ConnectorRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ConnectorRegistry")
      .field("connectors", &self.names())
      .finish()
  }
}
