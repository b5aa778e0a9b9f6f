//! Bytecode container passed between `asm.compile`, `asm.run` and `asm.debug`.

use std::fmt;
use std::str::FromStr;

use crate::error::VmError;

/// An opcode stream.
///
/// The text form is the comma-separated decimal list produced by the
/// assembler (`"1,2,255"`); the JSON form may also be an array of integers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bytecode(Vec<u8>);

impl Bytecode {
  pub fn new(codes: Vec<u8>) -> Self {
    Self(codes)
  }

  pub fn as_slice(&self) -> &[u8] {
    &self.0
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Decode bytecode from a JSON string or array.
  pub fn from_value(value: &serde_json::Value) -> Result<Self, VmError> {
    match value {
      serde_json::Value::String(text) => text.parse(),
      serde_json::Value::Array(items) => items
        .iter()
        .enumerate()
        .map(|(position, item)| {
          item
            .as_u64()
            .and_then(|n| u8::try_from(n).ok())
            .ok_or_else(|| VmError::InvalidBytecode {
              position,
              token: item.to_string(),
            })
        })
        .collect::<Result<Vec<u8>, VmError>>()
        .map(Self),
      other => Err(VmError::UnsupportedFormat {
        found: other.to_string(),
      }),
    }
  }
}

impl FromStr for Bytecode {
  type Err = VmError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    if s.is_empty() {
      return Ok(Self::default());
    }

    s.split(',')
      .enumerate()
      .map(|(position, token)| {
        let token = token.trim();
        token
          .parse::<u8>()
          .map_err(|_| VmError::InvalidBytecode {
            position,
            token: token.to_string(),
          })
      })
      .collect::<Result<Vec<u8>, VmError>>()
      .map(Self)
  }
}

impl fmt::Display for Bytecode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, code) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str(",")?;
      }
      write!(f, "{}", code)?;
    }
    Ok(())
  }
}

impl FromIterator<u8> for Bytecode {
  fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}
