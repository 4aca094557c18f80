use std::cell::Cell;
use std::io::{stdout, Write};

use colored::Colorize;

use crate::device::Printer;
use crate::machine::{Machine, IM, IS, SP};

/// Print diagnostic text to stderr, eg. `dprint!(Always, "{}", line)`.
#[macro_export]
macro_rules! dprint {
    ( $cond:ident, $($arg:tt)+ ) => {
        $crate::output::Output::Diagnostic($crate::output::Condition::$cond)
            .print_str(&format!($($arg)+))
    };
}

/// [`dprint!`] with a trailing newline.
#[macro_export]
macro_rules! dprintln {
    ( $cond:ident ) => {
        $crate::output::Output::Diagnostic($crate::output::Condition::$cond).print_str("\n")
    };
    ( $cond:ident, $($arg:tt)+ ) => {
        $crate::output::Output::Diagnostic($crate::output::Condition::$cond)
            .print_str(&format!("{}\n", format_args!($($arg)+)))
    };
}

/// Where text is sent: program output to stdout, everything about the run to stderr.
#[derive(Clone, Copy, Debug)]
pub enum Output {
    Normal,
    Diagnostic(Condition),
}

/// How diagnostic text is treated under `--minimal`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    /// Kept, without color. Traces and register dumps are compared by tests.
    Always,
    /// Dropped.
    Verbose,
}

thread_local! {
    /// Last program output ended with a newline
    static LINE_START: Cell<bool> = const { Cell::new(true) };
    static MINIMAL: Cell<bool> = const { Cell::new(false) };
}

impl Output {
    pub fn set_line_start(new_value: bool) -> bool {
        LINE_START.with(|value| value.replace(new_value))
    }

    pub fn set_minimal(new_value: bool) -> bool {
        MINIMAL.with(|value| value.replace(new_value))
    }

    pub fn is_minimal() -> bool {
        MINIMAL.with(Cell::get)
    }

    pub fn print_str(&self, string: &str) {
        match *self {
            Self::Normal => {
                print!("{string}");
                if let Some(last) = strip_ansi(string).chars().last() {
                    Self::set_line_start(last == '\n');
                }
            }
            Self::Diagnostic(condition) => {
                if !Self::is_minimal() {
                    eprint!("{}", string.blue());
                } else if condition == Condition::Always {
                    eprint!("{}", strip_ansi(string));
                }
            }
        }
    }

    /// Move program output to a fresh line, if the program left one unfinished.
    pub fn start_new_line(&self) {
        if !LINE_START.with(Cell::get) {
            self.print_str("\n");
        }
    }

    /// Register file, PC, IR and FL of a stopped machine.
    pub fn print_registers(&self, machine: &Machine) {
        if Self::is_minimal() {
            for (i, value) in machine.registers().iter().enumerate() {
                self.print_str(&format!("R{i} {value}\n"));
            }
            self.print_str(&format!("PC {}\n", machine.pc()));
            self.print_str(&format!("FL {:03b}\n", machine.flags()));
            return;
        }

        let rule = "\x1b[2m+-------+------+-----+----------+-----+\x1b[0m\n";
        let bar = "\x1b[2m|\x1b[0m";
        self.print_str(rule);
        self.print_str(&format!(
            "{bar} \x1b[3m{:<5}\x1b[0m {bar} \x1b[3m{:<4}\x1b[0m {bar} \x1b[3m{:>3}\x1b[0m {bar} \x1b[3m{:<8}\x1b[0m {bar} \x1b[3m{:<3}\x1b[0m {bar}\n",
            "reg", "hex", "dec", "bin", "chr"
        ));
        self.print_str(rule);
        for (i, &value) in machine.registers().iter().enumerate() {
            let name = match i {
                IM => format!("R{i}/IM"),
                IS => format!("R{i}/IS"),
                SP => format!("R{i}/SP"),
                _ => format!("R{i}"),
            };
            self.print_str(&format!(
                "{bar} \x1b[1m{name:<5}\x1b[0m {bar} 0x{value:02X} {bar} {value:>3} {bar} {value:08b} {bar} {} {bar}\n",
                char_label(value)
            ));
        }
        self.print_str(rule);
        let fl = machine.flags();
        let flag = |bit: u8, ch: char| if fl & bit != 0 { ch } else { '-' };
        let state = format!(
            "PC 0x{:02X}  IR 0x{:02X}  FL {}{}{}",
            machine.pc(),
            machine.ir(),
            flag(0b100, 'L'),
            flag(0b010, 'G'),
            flag(0b001, 'E'),
        );
        self.print_str(&format!("{bar} {state:<35} {bar}\n"));
        self.print_str(rule);
    }
}

/// Three column wide rendering of a byte as a character.
fn char_label(value: u8) -> String {
    let name = match value {
        0x00 => "NUL",
        0x08 => "BS",
        0x09 => "TAB",
        0x0A => "LF",
        0x0D => "CR",
        0x1B => "ESC",
        b' ' => "SPC",
        0x7F => "DEL",
        0x21..=0x7E => return format!("{:<3}", value as char),
        _ => return "\x1b[2m...\x1b[0m".to_string(),
    };
    format!("{name:<3}")
}

/// Remove ANSI escape sequences (`ESC` up to and including `m`).
fn strip_ansi(string: &str) -> String {
    let mut plain = String::with_capacity(string.len());
    let mut in_escape = false;
    for ch in string.chars() {
        match (in_escape, ch) {
            (false, '\x1b') => in_escape = true,
            (false, _) => plain.push(ch),
            (true, 'm') => in_escape = false,
            (true, _) => (),
        }
    }
    plain
}

/// Sends `PRN`/`PRA` output to stdout, flushing after each one.
#[derive(Debug, Default)]
pub struct Console {
    /// Terminal is in raw mode, so line feeds need a carriage return.
    raw: bool,
}

impl Console {
    pub fn new(raw: bool) -> Self {
        Console { raw }
    }

    fn emit(&self, string: &str) {
        if self.raw {
            Output::Normal.print_str(&string.replace('\n', "\r\n"));
        } else {
            Output::Normal.print_str(string);
        }
        let _ = stdout().flush();
    }
}

impl Printer for Console {
    fn print_number(&mut self, value: u8) {
        self.emit(&format!("{value}\n"));
    }

    fn print_char(&mut self, value: u8) {
        let mut buf = [0; 4];
        self.emit((value as char).encode_utf8(&mut buf));
    }
}
