use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{miette, Result};

use ls8::output::Output;
use ls8::{disasm, loader, Features, Halt, RunEnvironment};

/// ls8 loads and runs programs for the LS-8, a tiny 8-bit stored-program computer.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.ls8` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run text `.ls8` or binary `.bin` program and output to terminal
    Run {
        /// `.ls8` or `.bin` file to run
        name: PathBuf,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
        /// Print machine state before every cycle (also `LS8_TRACE=1`)
        #[arg(short, long)]
        trace: bool,
        /// Print registers once the program stops
        #[arg(short, long)]
        dump: bool,
        /// Comma separated machine features: interrupts, keyboard, timer
        #[arg(short, long, value_name = "LIST")]
        features: Option<Features>,
    },
    /// Check a program loads without running it
    Check {
        /// File to check
        name: PathBuf,
    },
    /// List the instructions of a program
    Disasm {
        /// `.ls8` or `.bin` file to list
        name: PathBuf,
    },
}

struct RunOptions {
    minimal: bool,
    trace: bool,
    dump: bool,
    features: Option<Features>,
}

fn main() -> miette::Result<()> {
    let args = Args::parse();
    ls8::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(ls8::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    match args.command {
        Some(Command::Run {
            name,
            minimal,
            trace,
            dump,
            features,
        }) => run(
            &name,
            RunOptions {
                minimal,
                trace,
                dump,
                features,
            },
        ),
        Some(Command::Check { name }) => {
            file_message(MsgColor::Green, "Checking", &name);
            let program = loader::load_file(&name)?;
            let summary = format!("{} bytes, no errors found!", program.len());
            message(MsgColor::Green, "Success", summary.as_str());
            Ok(())
        }
        Some(Command::Disasm { name }) => {
            let program = loader::load_file(&name)?;
            for line in disasm::disassemble(&program) {
                println!("{line}");
            }
            Ok(())
        }
        None => {
            if let Some(path) = args.path {
                run(
                    &path,
                    RunOptions {
                        minimal: false,
                        trace: false,
                        dump: false,
                        features: None,
                    },
                )
            } else {
                println!("\n~ ls8 v{VERSION} ~");
                println!("{}", LOGO.truecolor(120, 200, 160).bold());
                println!("{SHORT_INFO}");
                Ok(())
            }
        }
    }
}

enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, right.as_str());
}

fn message<S>(color: MsgColor, left: S, right: S)
where
    S: Colorize + std::fmt::Display,
{
    if Output::is_minimal() {
        return;
    }
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

/// Features from the command line, then `LS8_FEATURES`, then the default set.
fn features(from_args: Option<Features>) -> Result<Features> {
    if let Some(features) = from_args {
        return Ok(features);
    }
    let list = ls8::env::features().unwrap_or(Features::DEFAULT_LIST);
    list.parse()
        .map_err(|e| miette!(code = "env::features", "Invalid LS8_FEATURES: {e}"))
}

fn run(name: &Path, opts: RunOptions) -> Result<()> {
    Output::set_minimal(opts.minimal);
    let features = features(opts.features)?;

    file_message(MsgColor::Green, "Loading", name);
    let program = loader::load_file(name)?;
    let mut env = RunEnvironment::from_raw(&program, features)?;
    env.set_trace(opts.trace || ls8::env::is_trace_enabled());
    env.set_dump(opts.dump);

    let features = match features.to_string() {
        list if list.is_empty() => "minimal instruction set".to_string(),
        list => format!("features {list}"),
    };
    message(MsgColor::Green, "Running", features.as_str());
    match env.run()? {
        Halt::Instruction => message(MsgColor::Cyan, "Halted", "HLT instruction"),
        Halt::DivideByZero { .. } => message(MsgColor::Red, "Halted", "divide by zero"),
    }

    file_message(MsgColor::Green, "Completed", name);
    Ok(())
}

const LOGO: &str = r#"
  _       ___     ___
 | |     / __|   ( _ )
 | |__   \__ \   / _ \
 |____|  |___/   \___/"#;

const SHORT_INFO: &str = r"
An emulator for the LS-8, an 8-bit computer with 256 bytes of memory,
eight registers, a stack and interrupts.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
