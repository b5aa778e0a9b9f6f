//! The sandbox machine.
//!
//! A [`Machine`] owns its registers, memory, program counter and halted flag.
//! Every [`Machine::execute`] / [`Machine::debug`] call starts from a zeroed
//! state, and callers construct one machine per invocation, so concurrent
//! runs never share state.
//!
//! Only `HLT` has an effect: it halts the machine. Every other opcode advances
//! the program counter, since the assembler does not encode operands. Runs are
//! bounded by [`MAX_CYCLES`] (execute) and [`MAX_DEBUG_STEPS`] (debug);
//! reaching a bound simply stops the machine.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::opcode::Opcode;

pub const REGISTER_COUNT: usize = 16;
pub const MEMORY_SIZE: usize = 64 * 1024;
pub const MAX_CYCLES: usize = 10_000;
pub const MAX_DEBUG_STEPS: usize = 1_000;

/// General purpose registers `R0`..`R15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Registers([i64; REGISTER_COUNT]);

impl Registers {
  pub fn get(&self, index: usize) -> Option<i64> {
    self.0.get(index).copied()
  }
}

// Serialized as an ordered `{ "R0": 0, ..., "R15": 0 }` object.
impl Serialize for Registers {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(REGISTER_COUNT))?;
    for (i, value) in self.0.iter().enumerate() {
      map.serialize_entry(&format!("R{}", i), value)?;
    }
    map.end()
  }
}

/// Outcome of [`Machine::execute`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
  pub registers: Registers,
  /// Log lines joined with newlines.
  pub output: String,
  /// `0` if `HLT` was reached, `1` otherwise.
  pub exit_code: i32,
  pub logs: Vec<String>,
  pub cycles: usize,
}

/// Machine state exposed after a debug session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineState {
  pub pc: usize,
  pub registers: Registers,
  pub halted: bool,
}

/// Outcome of [`Machine::debug`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugReport {
  pub breakpoints_hit: Vec<usize>,
  pub steps_executed: usize,
  pub final_state: MachineState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
  Continue,
  Halted,
}

pub struct Machine {
  registers: Registers,
  memory: Vec<u8>,
  pc: usize,
  halted: bool,
}

impl Machine {
  pub fn new() -> Self {
    Self {
      registers: Registers::default(),
      memory: vec![0; MEMORY_SIZE],
      pc: 0,
      halted: false,
    }
  }

  /// Run bytecode until `HLT`, the end of the program, or [`MAX_CYCLES`].
  pub fn execute(&mut self, bytecode: &[u8]) -> ExecutionReport {
    self.reset();
    let mut logs = Vec::new();
    let mut cycles = 0;

    while self.pc < bytecode.len() && !self.halted && cycles < MAX_CYCLES {
      if self.step(bytecode[self.pc]) == Step::Halted {
        logs.push(format!("HLT at PC={}", self.pc));
        break;
      }
      cycles += 1;
    }

    ExecutionReport {
      registers: self.registers,
      output: logs.join("\n"),
      exit_code: if self.halted { 0 } else { 1 },
      logs,
      cycles,
    }
  }

  /// Step through bytecode, recording every program counter value that is a
  /// breakpoint. Bounded by [`MAX_DEBUG_STEPS`].
  pub fn debug(&mut self, bytecode: &[u8], breakpoints: &[usize]) -> DebugReport {
    self.reset();
    let mut breakpoints_hit = Vec::new();
    let mut steps_executed = 0;

    while self.pc < bytecode.len() && !self.halted && steps_executed < MAX_DEBUG_STEPS {
      if breakpoints.contains(&self.pc) {
        breakpoints_hit.push(self.pc);
      }
      if self.step(bytecode[self.pc]) == Step::Halted {
        break;
      }
      steps_executed += 1;
    }

    DebugReport {
      breakpoints_hit,
      steps_executed,
      final_state: self.state(),
    }
  }

  pub fn state(&self) -> MachineState {
    MachineState {
      pc: self.pc,
      registers: self.registers,
      halted: self.halted,
    }
  }

  pub fn memory(&self) -> &[u8] {
    &self.memory
  }

  fn reset(&mut self) {
    self.registers = Registers::default();
    self.memory.fill(0);
    self.pc = 0;
    self.halted = false;
  }

  fn step(&mut self, opcode: u8) -> Step {
    if opcode == Opcode::Hlt.code() {
      self.halted = true;
      return Step::Halted;
    }
    self.pc += 1;
    Step::Continue
  }
}

impl Default for Machine {
  fn default() -> Self {
    Self::new()
  }
}
