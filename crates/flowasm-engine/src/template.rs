//! Cross-node template resolution.
//!
//! A node's config strings may reference results of nodes that ran before it:
//!
//! ```json
//! { "bytecode": "{{node.compile.artifacts.bytecode}}",
//!   "jobName": "PAY-{{node.submit.artifacts.jobId}}" }
//! ```
//!
//! The path is walked from the root of the referenced [`NodeResult`] as it
//! serializes (`artifacts`, `logs`, `metadata`, `inputs`, `success`, ...).
//! Numeric segments index into arrays.
//!
//! Resolution never fails. A reference to an unknown node or a missing path
//! is left in place verbatim. A string that is exactly one reference takes the
//! referenced value with its JSON type; references embedded in other text are
//! spliced in (strings raw, everything else as compact JSON).

use flowasm_config::ConfigMap;
use serde_json::Value;

use crate::result::NodeResult;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A parsed `node.<id>.<path>` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRef {
  pub node_id: String,
  pub path: Vec<String>,
}

impl TemplateRef {
  /// Parse the text between `{{` and `}}`.
  ///
  /// The node id must be non-empty and free of `.` and `}`; the path needs at
  /// least one segment and no empty segments.
  pub fn parse(expr: &str) -> Option<Self> {
    let rest = expr.strip_prefix("node.")?;
    let (node_id, path) = rest.split_once('.')?;
    if node_id.is_empty() || node_id.contains('}') {
      return None;
    }

    let path: Vec<String> = path.split('.').map(str::to_string).collect();
    if path.iter().any(String::is_empty) {
      return None;
    }

    Some(Self {
      node_id: node_id.to_string(),
      path,
    })
  }

  /// Look the reference up among prior results.
  pub fn lookup(&self, results: &[NodeResult]) -> Option<Value> {
    let result = results.iter().find(|r| r.id == self.node_id)?;
    let root = serde_json::to_value(result).ok()?;

    let mut current = &root;
    for segment in &self.path {
      current = match current {
        Value::Object(map) => map.get(segment)?,
        Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
        _ => return None,
      };
    }
    Some(current.clone())
  }
}

/// Resolve every reference in a node config. The input is not modified.
pub fn resolve_config(config: &ConfigMap, results: &[NodeResult]) -> ConfigMap {
  config
    .iter()
    .map(|(key, value)| {
      let resolved = match value {
        Value::String(text) if text.contains(OPEN) => resolve_str(text, results),
        other => other.clone(),
      };
      (key.clone(), resolved)
    })
    .collect()
}

/// Resolve references in a single string.
pub fn resolve_str(text: &str, results: &[NodeResult]) -> Value {
  if let Some(value) = whole_reference(text).and_then(|r| r.lookup(results)) {
    return value;
  }

  let mut out = String::with_capacity(text.len());
  let mut rest = text;

  while let Some(start) = rest.find(OPEN) {
    out.push_str(&rest[..start]);
    let inner = &rest[start + OPEN.len()..];

    let Some(end) = inner.find(CLOSE) else {
      out.push_str(&rest[start..]);
      return Value::String(out);
    };

    match TemplateRef::parse(&inner[..end]) {
      Some(reference) => {
        match reference.lookup(results) {
          Some(Value::String(s)) => out.push_str(&s),
          Some(other) => out.push_str(&other.to_string()),
          None => out.push_str(&rest[start..start + OPEN.len() + end + CLOSE.len()]),
        }
        rest = &inner[end + CLOSE.len()..];
      }
      None => {
        // Not a reference; keep one brace and rescan from the next character.
        out.push('{');
        rest = &rest[start + 1..];
      }
    }
  }

  out.push_str(rest);
  Value::String(out)
}

/// The reference if `text` is exactly `{{node.<id>.<path>}}`.
fn whole_reference(text: &str) -> Option<TemplateRef> {
  let inner = text.strip_prefix(OPEN)?.strip_suffix(CLOSE)?;
  if inner.contains(CLOSE) {
    return None;
  }
  TemplateRef::parse(inner)
}
