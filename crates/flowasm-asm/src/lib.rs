//! FlowASM sandbox.
//!
//! A two-pass micro-assembler, a bytecode virtual machine with sixteen
//! registers and 64 KiB of memory, and the [`AsmSandboxConnector`] that exposes
//! both to workflows as `asm.compile`, `asm.run` and `asm.debug`.

mod assembler;
mod bytecode;
mod connector;
mod error;
mod opcode;
mod vm;

pub use assembler::{Instruction, Program, assemble};
pub use bytecode::Bytecode;
pub use connector::{AsmAction, AsmSandboxConnector};
pub use error::{AsmError, VmError};
pub use opcode::Opcode;
pub use vm::{
  DebugReport, ExecutionReport, MAX_CYCLES, MAX_DEBUG_STEPS, MEMORY_SIZE, Machine, MachineState,
  REGISTER_COUNT, Registers,
};
