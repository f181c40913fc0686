use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use miette::{IntoDiagnostic, Report};

use lc3vm::device::{Input, PipedInput};
use lc3vm::output::{self, MsgColor};
use lc3vm::term::{CrlfWriter, RawMode, TerminalInput, INTERRUPT_EXIT_CODE};
use lc3vm::{Image, Registers, RunState, RuntimeError, Status};

/// Run a binary LC3 program image.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// `.obj` image to run: big-endian words, origin first
    image: PathBuf,
    /// Produce minimal output, suited for blackbox tests
    #[arg(short, long)]
    minimal: bool,
    /// Print every executed instruction to stderr
    #[arg(short, long)]
    trace: bool,
}

/// Exit status for images that cannot be loaded.
const LOAD_FAILURE: u8 = 2;

fn main() -> ExitCode {
    let args = Args::parse();
    lc3vm::env::init();
    output::set_minimal(args.minimal || lc3vm::env::is_minimal());
    let trace = args.trace || lc3vm::env::is_trace();

    if let Err(err) = miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::new().build())
    })) {
        eprintln!("{err}");
    }

    output::message(MsgColor::Green, "Loading", target(&args.image));
    let image = match Image::read(&args.image) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("{:?}", Report::new(err));
            return ExitCode::from(LOAD_FAILURE);
        }
    };

    output::message(
        MsgColor::Cyan,
        "Running",
        format!("from 0x{:04x}", image.orig()),
    );
    let result = if io::stdin().is_terminal() {
        match run_terminal(&image, trace) {
            Ok(result) => result,
            Err(report) => {
                eprintln!("{report:?}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        run(&image, PipedInput::new(), io::stdout().lock(), trace)
    };

    match result {
        Ok(Stopped {
            status: Status::Interrupted,
            ..
        }) => {
            // Raw mode is already restored
            println!();
            ExitCode::from(INTERRUPT_EXIT_CODE as u8)
        }
        Ok(Stopped { count, .. }) => {
            output::message(
                MsgColor::Green,
                "Completed",
                format!("{} after {} instructions", target(&args.image), count),
            );
            ExitCode::SUCCESS
        }
        Err(Failure { error, registers }) => {
            // Keep diagnostics below any partial program output
            eprintln!();
            output::message(MsgColor::Red, "Error", target(&args.image));
            eprintln!("{:?}", Report::new(error));
            output::print_registers(&registers);
            ExitCode::FAILURE
        }
    }
}

fn target(path: &Path) -> String {
    format!("target {}", path.display())
}

/// Machine state after the program stopped normally.
struct Stopped {
    status: Status,
    /// Instructions executed
    count: u64,
}

/// Machine state at the point of a fatal error.
struct Failure {
    error: RuntimeError,
    registers: Registers,
}

/// Run with an unbuffered keyboard, restoring the terminal afterwards.
fn run_terminal(image: &Image, trace: bool) -> miette::Result<Result<Stopped, Failure>> {
    let _raw_mode = RawMode::enable().into_diagnostic()?;
    // Stdout may be redirected while stdin is still a terminal
    let stdout = io::stdout();
    let is_terminal = stdout.is_terminal();
    Ok(run(
        image,
        TerminalInput::new(),
        CrlfWriter::new(stdout.lock(), is_terminal),
        trace,
    ))
}

fn run<I, W>(image: &Image, input: I, console: W, trace: bool) -> Result<Stopped, Failure>
where
    I: Input,
    W: Write,
{
    let mut state = RunState::new(image, input, console);
    state.set_trace(trace);
    match state.run() {
        Ok(()) => Ok(Stopped {
            status: state.status(),
            count: state.instruction_count(),
        }),
        Err(error) => Err(Failure {
            error,
            registers: state.registers().clone(),
        }),
    }
}
