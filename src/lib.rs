// Machine
pub mod machine;
pub use machine::{Halt, Machine, Status};
pub mod opcode;
pub use opcode::{Instruction, Opcode};
pub mod device;
pub mod features;
pub use features::Features;

// Loading
mod lexer;
pub mod loader;
mod span;

// Running
mod runtime;
pub use runtime::{trace_line, RunEnvironment};
#[macro_use]
pub mod output;
mod term;
pub use term::Keyboard;

pub mod disasm;
pub mod env;
mod error;
pub use error::MachineError;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 4;
