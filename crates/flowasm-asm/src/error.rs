//! Sandbox error types.

use flowasm_connector::ConnectorError;
use thiserror::Error;

/// Errors raised while assembling source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsmError {
  /// The mnemonic is not part of the instruction set.
  #[error("unknown instruction: {mnemonic} (line {line})")]
  UnknownInstruction { mnemonic: String, line: usize },
}

/// Errors raised while loading bytecode into the machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
  /// A bytecode element is not an integer in `0..=255`.
  #[error("invalid bytecode at position {position}: '{token}'")]
  InvalidBytecode { position: usize, token: String },

  /// Bytecode was neither comma-separated text nor an array.
  #[error("bytecode must be a comma-separated string or an array of integers, got {found}")]
  UnsupportedFormat { found: String },
}

/// Any failure inside the sandbox connector.
#[derive(Debug, Error)]
pub(crate) enum SandboxError {
  #[error(transparent)]
  Input(#[from] ConnectorError),

  #[error(transparent)]
  Asm(#[from] AsmError),

  #[error(transparent)]
  Vm(#[from] VmError),

  #[error("failed to serialize result: {0}")]
  Serialization(#[from] serde_json::Error),
}
