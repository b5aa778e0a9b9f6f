//! Two-pass assembler.
//!
//! Source is line oriented:
//!
//! ```text
//! .TEXT              ; directive, never an instruction
//! main:              ; label, bound to the next instruction address
//!   MOV R0, #42      ; mnemonic followed by comma/space separated operands
//!   HLT
//! ```
//!
//! The first pass binds labels to addresses (one instruction per line). The
//! second pass resolves mnemonics to opcodes. Operands are kept on the
//! parsed [`Instruction`] but are not encoded into the emitted bytecode; the
//! sandbox machine only interprets control flow.

use std::collections::BTreeMap;

use crate::bytecode::Bytecode;
use crate::error::AsmError;
use crate::opcode::Opcode;

/// One assembled instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
  pub opcode: Opcode,
  pub operands: Vec<String>,
  /// 1-based source line.
  pub line: usize,
}

/// The result of a successful assembly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
  pub instructions: Vec<Instruction>,
  /// Label name to instruction address.
  pub labels: BTreeMap<String, usize>,
}

impl Program {
  pub fn instruction_count(&self) -> usize {
    self.instructions.len()
  }

  pub fn bytecode(&self) -> Bytecode {
    self.instructions.iter().map(|i| i.opcode.code()).collect()
  }
}

/// A classified source line.
enum Line<'a> {
  Directive,
  Label(&'a str),
  Instruction(&'a str),
}

/// Assemble source text. No partial program is returned on error.
pub fn assemble(source: &str) -> Result<Program, AsmError> {
  let lines: Vec<(usize, Line<'_>)> = source
    .lines()
    .enumerate()
    .filter_map(|(idx, raw)| classify(raw).map(|line| (idx + 1, line)))
    .collect();

  // Pass 1: labels
  let mut labels = BTreeMap::new();
  let mut address = 0;
  for (_, line) in &lines {
    match line {
      Line::Label(name) => {
        labels.insert(name.to_string(), address);
      }
      Line::Instruction(_) => address += 1,
      Line::Directive => {}
    }
  }

  // Pass 2: instructions
  let mut instructions = Vec::with_capacity(address);
  for (line_no, line) in &lines {
    if let Line::Instruction(text) = line {
      instructions.push(parse_instruction(text, *line_no)?);
    }
  }

  Ok(Program {
    instructions,
    labels,
  })
}

/// Strip comments and classify a line. Blank lines yield `None`.
fn classify(raw: &str) -> Option<Line<'_>> {
  let text = match raw.find(';') {
    Some(idx) => &raw[..idx],
    None => raw,
  }
  .trim();

  if text.is_empty() {
    return None;
  }

  // A colon anywhere makes the line a label; anything after it is ignored.
  if let Some((name, _)) = text.split_once(':') {
    return Some(Line::Label(name.trim()));
  }

  if text.starts_with('.') {
    return Some(Line::Directive);
  }

  Some(Line::Instruction(text))
}

fn parse_instruction(text: &str, line: usize) -> Result<Instruction, AsmError> {
  let mut tokens = text
    .split(|c: char| c.is_whitespace() || c == ',')
    .filter(|t| !t.is_empty());

  // `text` is non-empty and trimmed, so there is always a first token.
  let mnemonic = tokens.next().unwrap_or_default();
  let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| AsmError::UnknownInstruction {
    mnemonic: mnemonic.to_ascii_uppercase(),
    line,
  })?;

  Ok(Instruction {
    opcode,
    operands: tokens.map(str::to_string).collect(),
    line,
  })
}
