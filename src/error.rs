use std::{error::Error, fmt};

use miette::{miette, LabeledSpan, Report, Severity};

use crate::span::Span;

/// Fault raised by the machine while loading or executing a program.
///
/// Every fault ends the run. Faults raised mid-instruction carry the address of the instruction
/// being executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MachineError {
    UnknownOpcode { opcode: u8, pc: u8 },
    InvalidRegister { index: u8, pc: u8 },
    /// `INT` with an interrupt number outside `0..8`.
    InvalidInterrupt { number: u8, pc: u8 },
    /// Operand fetch, PC advance or return address fell outside of memory.
    AddressOutOfRange { address: usize, pc: u8 },
    /// Push with SP already at address 0.
    StackOverflow { pc: u8 },
    /// Pop with SP already at the last address of memory.
    StackUnderflow { pc: u8 },
    ProgramTooLarge { size: usize },
}

impl MachineError {
    /// Diagnostic code, used when rendering as a report.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownOpcode { .. } => "runtime::unknown_opcode",
            Self::InvalidRegister { .. } => "runtime::invalid_register",
            Self::InvalidInterrupt { .. } => "runtime::invalid_interrupt",
            Self::AddressOutOfRange { .. } => "runtime::address_out_of_range",
            Self::StackOverflow { .. } => "runtime::stack_overflow",
            Self::StackUnderflow { .. } => "runtime::stack_underflow",
            Self::ProgramTooLarge { .. } => "load::too_large",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            Self::UnknownOpcode { .. } => {
                "check that execution did not run into data, or enable the `interrupts` feature for INT/IRET"
            }
            Self::InvalidRegister { .. } => "registers are numbered R0 to R7",
            Self::InvalidInterrupt { .. } => "interrupts are numbered 0 to 7",
            Self::AddressOutOfRange { .. } => {
                "memory ends at 0xFF; make sure the program halts before running off the end"
            }
            Self::StackOverflow { .. } => "too many values were pushed; check for runaway recursion",
            Self::StackUnderflow { .. } => "more values were popped than pushed",
            Self::ProgramTooLarge { .. } => "programs must fit in 256 bytes of memory",
        }
    }
}

impl Error for MachineError {}

impl fmt::Display for MachineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode { opcode, pc } => {
                write!(f, "Unknown opcode 0b{opcode:08b} at 0x{pc:02X}")
            }
            Self::InvalidRegister { index, pc } => {
                write!(f, "Invalid register R{index} used at 0x{pc:02X}")
            }
            Self::InvalidInterrupt { number, pc } => {
                write!(f, "Invalid interrupt number {number} raised at 0x{pc:02X}")
            }
            Self::AddressOutOfRange { address, pc } => {
                write!(
                    f,
                    "Address 0x{address:X} is outside of memory (instruction at 0x{pc:02X})"
                )
            }
            Self::StackOverflow { pc } => write!(f, "Stack overflow at 0x{pc:02X}"),
            Self::StackUnderflow { pc } => write!(f, "Stack underflow at 0x{pc:02X}"),
            Self::ProgramTooLarge { size } => {
                write!(f, "Program is {size} bytes long and cannot fit in memory")
            }
        }
    }
}

// Runtime errors

pub fn runtime_fault(err: MachineError) -> Report {
    miette!(
        severity = Severity::Error,
        code = err.code(),
        help = err.help(),
        "{err}",
    )
}

// Loader errors

pub fn load_unknown(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::unknown",
        help = "every instruction byte must be written as binary digits, like 10000010",
        labels = vec![LabeledSpan::at(span, "not a binary literal")],
        "Encountered an unknown token",
    )
    .with_source_code(src.to_owned())
}

pub fn load_too_wide(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::too_wide",
        help = "bytes are at most 8 binary digits wide",
        labels = vec![LabeledSpan::at(span, "too many digits")],
        "Binary literal does not fit in a byte",
    )
    .with_source_code(src.to_owned())
}

pub fn load_too_large(span: Span, src: &str, size: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::too_large",
        help = "programs must fit in 256 bytes of memory",
        labels = vec![LabeledSpan::at(span, "first byte past end of memory")],
        "Program is {size} bytes long and cannot fit in memory",
    )
    .with_source_code(src.to_owned())
}
