//! Opcodes of the sandbox instruction set.

/// Instruction set of the sandbox machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
  // Data movement & arithmetic
  Mov = 0x01,
  Add = 0x02,
  Sub = 0x03,
  Mul = 0x04,
  Div = 0x05,
  Cmp = 0x06,

  // Control flow
  Jmp = 0x07,
  Je = 0x08,
  Jne = 0x09,
  Jg = 0x0A,
  Jl = 0x0B,
  Call = 0x0C,
  Ret = 0x0D,

  // Stack
  Push = 0x0E,
  Pop = 0x0F,

  Hlt = 0xFF,
}

impl Opcode {
  pub const ALL: [Opcode; 16] = [
    Opcode::Mov,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Div,
    Opcode::Cmp,
    Opcode::Jmp,
    Opcode::Je,
    Opcode::Jne,
    Opcode::Jg,
    Opcode::Jl,
    Opcode::Call,
    Opcode::Ret,
    Opcode::Push,
    Opcode::Pop,
    Opcode::Hlt,
  ];

  /// Look up a mnemonic, ignoring case.
  pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
    Self::ALL
      .into_iter()
      .find(|op| op.mnemonic().eq_ignore_ascii_case(mnemonic))
  }

  pub fn from_code(code: u8) -> Option<Self> {
    Self::ALL.into_iter().find(|op| op.code() == code)
  }

  pub fn code(self) -> u8 {
    self as u8
  }

  pub fn mnemonic(self) -> &'static str {
    match self {
      Opcode::Mov => "MOV",
      Opcode::Add => "ADD",
      Opcode::Sub => "SUB",
      Opcode::Mul => "MUL",
      Opcode::Div => "DIV",
      Opcode::Cmp => "CMP",
      Opcode::Jmp => "JMP",
      Opcode::Je => "JE",
      Opcode::Jne => "JNE",
      Opcode::Jg => "JG",
      Opcode::Jl => "JL",
      Opcode::Call => "CALL",
      Opcode::Ret => "RET",
      Opcode::Push => "PUSH",
      Opcode::Pop => "POP",
      Opcode::Hlt => "HLT",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_mnemonic_lookup_is_case_insensitive() {
    assert_eq!(Opcode::from_mnemonic("mov"), Some(Opcode::Mov));
    assert_eq!(Opcode::from_mnemonic("Hlt"), Some(Opcode::Hlt));
    assert_eq!(Opcode::from_mnemonic("FOO"), None);
  }

  #[test]
  fn test_codes() {
    assert_eq!(Opcode::Mov.code(), 0x01);
    assert_eq!(Opcode::Pop.code(), 0x0F);
    assert_eq!(Opcode::Hlt.code(), 255);
    assert_eq!(Opcode::from_code(0x0A), Some(Opcode::Jg));
    assert_eq!(Opcode::from_code(0x10), None);
  }
}
