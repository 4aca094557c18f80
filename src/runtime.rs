use std::fmt::Write;

use miette::Result;

use crate::device::{InterruptSource, Printer, Timer};
use crate::error;
use crate::features::Features;
use crate::machine::{Halt, Machine, Status};
use crate::output::{Condition, Console, Output};
use crate::term::Keyboard;
use crate::{dprint, dprintln};

/// A loaded machine together with the way it should be run from the terminal.
pub struct RunEnvironment {
    machine: Machine,
    /// Print a trace line before every cycle
    trace: bool,
    /// Print the register file once the machine stops
    dump: bool,
}

impl RunEnvironment {
    pub fn from_raw(program: &[u8], features: Features) -> Result<RunEnvironment> {
        let machine = Machine::from_raw(program, features).map_err(error::runtime_fault)?;
        Ok(RunEnvironment {
            machine,
            trace: false,
            dump: false,
        })
    }

    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    pub fn set_dump(&mut self, dump: bool) {
        self.dump = dump;
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Run attached to the terminal: output on stdout, interrupts from the enabled devices.
    pub fn run(&mut self) -> Result<Halt> {
        let features = self.machine.features();
        let mut sources: Vec<Box<dyn InterruptSource>> = Vec::new();
        let mut raw = false;
        if features.keyboard {
            match Keyboard::new() {
                Some(keyboard) => {
                    sources.push(Box::new(keyboard));
                    raw = true;
                }
                None => dprintln!(Verbose, "Keyboard unavailable: stdin is not a terminal"),
            }
        }
        if features.timer {
            sources.push(Box::new(Timer::seconds()));
        }

        let mut console = Console::new(raw);
        let result = self.run_with(&mut console, &mut sources, raw);
        // Leave raw mode before anything else is printed
        drop(sources);
        if self.dump {
            Output::Diagnostic(Condition::Always).print_registers(&self.machine);
        }
        result
    }

    /// Run to completion with the given devices.
    pub fn run_with(
        &mut self,
        printer: &mut dyn Printer,
        source: &mut dyn InterruptSource,
        raw: bool,
    ) -> Result<Halt> {
        let eol = if raw { "\r\n" } else { "\n" };
        let halt = loop {
            if self.trace {
                dprint!(Always, "{}{}", trace_line(&self.machine), eol);
            }
            match self.machine.step(printer, source) {
                Ok(Status::Running) => continue,
                Ok(Status::Halted(halt)) => break halt,
                Err(err) => {
                    Output::Normal.start_new_line();
                    return Err(error::runtime_fault(err));
                }
            }
        };

        Output::Normal.start_new_line();
        if let Halt::DivideByZero { pc } = halt {
            Output::Normal.print_str(&format!(
                "Invalid value error: cannot divide by zero (instruction at 0x{pc:02X})\n"
            ));
        }
        Ok(halt)
    }
}

/// `TRACE: PC | IR OP1 OP2 | R0 .. R7 | instruction`, all in hex.
pub fn trace_line(machine: &Machine) -> String {
    let pc = machine.pc() as usize;
    let byte = |offset: usize| machine.memory().get(pc + offset).copied().unwrap_or(0);

    let mut line = format!(
        "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
        pc,
        byte(0),
        byte(1),
        byte(2)
    );
    for value in machine.registers() {
        let _ = write!(line, " {:02X}", value);
    }
    match machine.fetch() {
        Ok(instr) => {
            let _ = write!(line, " | {}", instr);
        }
        Err(_) => line.push_str(" | ???"),
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::NoInterrupts;

    #[test]
    fn traces_state_before_execution() {
        let program = [0b1000_0010, 0, 8, 0b0000_0001];
        let machine = Machine::from_raw(&program, Features::interrupts()).unwrap();
        assert_eq!(
            trace_line(&machine),
            "TRACE: 00 | 82 00 08 | 00 00 00 00 00 FF 00 F4 | LDI R0,8"
        );
    }

    #[test]
    fn traces_unknown_opcode() {
        let machine = Machine::from_raw(&[0xFF], Features::default()).unwrap();
        assert!(trace_line(&machine).ends_with("| ???"));
    }

    #[test]
    fn runs_to_halt() {
        let program = [0b1000_0010, 0, 8, 0b0100_0111, 0, 0b0000_0001];
        let mut env = RunEnvironment::from_raw(&program, Features::interrupts()).unwrap();
        let mut out = String::new();
        let halt = env.run_with(&mut out, &mut NoInterrupts, false).unwrap();
        assert_eq!(halt, Halt::Instruction);
        assert_eq!(out, "8\n");
        assert_eq!(env.machine().reg(0), 8);
    }

    #[test]
    fn faults_become_reports() {
        let mut env = RunEnvironment::from_raw(&[0xFF], Features::default()).unwrap();
        let err = env
            .run_with(&mut String::new(), &mut NoInterrupts, false)
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown opcode 0b11111111 at 0x00");
    }
}
