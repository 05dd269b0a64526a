//! UM32 command-line host
//!
//! Runs, assembles, disassembles and inspects UM32 programs.

mod dump;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dump::StateDump;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use um32_assembler::assemble;
use um32_disassembler::disassemble_to;
use um32_runtime::{
    Machine, MachineConfig, StopReason, StreamReader, StreamWriter, DEFAULT_HEAP_LIMIT,
};
use um32_spec::Program;

#[derive(Parser)]
#[command(name = "um32")]
#[command(version, about = "UM32 virtual machine")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log every executed instruction to stderr
    #[arg(long, global = true)]
    trace: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run a program with stdin and stdout as byte I/O
    Run {
        /// Program file (big-endian words)
        file: PathBuf,

        /// Stop after this many cycles
        #[arg(long)]
        max_cycles: Option<u64>,

        /// Maximum heap size in words
        #[arg(long, default_value_t = DEFAULT_HEAP_LIMIT)]
        heap_limit: u32,

        /// Print the final machine state to stdout
        #[arg(long)]
        dump: bool,
    },

    /// Assemble source text into a program file
    Asm {
        /// Source file (stdin when absent)
        input: Option<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Disassemble a program file to stdout
    Dasm {
        file: PathBuf,
    },

    /// Load a program without running it and print the machine state
    Dump {
        file: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.trace);

    match cli.command {
        Command::Run {
            file,
            max_cycles,
            heap_limit,
            dump,
        } => run(&file, MachineConfig { max_cycles, heap_limit }, dump),
        Command::Asm { input, output } => asm(input.as_deref(), &output),
        Command::Dasm { file } => dasm(&file),
        Command::Dump { file } => dump(&file),
    }
}

fn init_tracing(trace: bool) {
    let default = if trace { "warn,um32_runtime=trace" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_program(path: &Path) -> Result<Program> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Program::read_from(BufReader::new(file))
        .with_context(|| format!("Failed to read program {}", path.display()))
}

fn load_machine(path: &Path, config: MachineConfig) -> Result<Machine> {
    let program = read_program(path)?;
    let mut machine = Machine::new(config).context("Failed to create machine")?;
    machine.load_program(&program).context("Failed to load program")?;
    Ok(machine)
}

fn run(path: &Path, config: MachineConfig, dump: bool) -> Result<ExitCode> {
    let mut machine = load_machine(path, config)?
        .with_reader(StreamReader::new(io::stdin()))
        .with_writer(StreamWriter::new(BufWriter::new(io::stdout())));

    let result = machine.run();
    machine.flush();
    tracing::info!(cycles = result.cycles, stop = ?result.stop, "run finished");

    if dump {
        print!("{}", StateDump(&machine));
    }

    match result.stop {
        StopReason::Fault(fault) if fault.is_stopped() => Ok(ExitCode::SUCCESS),
        StopReason::Fault(fault) => {
            eprintln!("um32: {}: {}", path.display(), fault);
            eprint!("{}", StateDump(&machine));
            Ok(ExitCode::FAILURE)
        }
        StopReason::CycleLimit => {
            eprintln!("um32: {}: stopped after {} cycles", path.display(), result.cycles);
            eprint!("{}", StateDump(&machine));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn asm(input: Option<&Path>, output: &Path) -> Result<ExitCode> {
    let source = match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("Failed to read stdin")?;
            buf
        }
    };

    let program = assemble(&source).context("Assembly failed")?;

    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    program
        .write_to(BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(words = program.len(), output = %output.display(), "assembled");
    Ok(ExitCode::SUCCESS)
}

fn dasm(path: &Path) -> Result<ExitCode> {
    let program = read_program(path)?;
    disassemble_to(&program.words, io::stdout().lock()).context("Failed to write listing")?;
    Ok(ExitCode::SUCCESS)
}

fn dump(path: &Path) -> Result<ExitCode> {
    let machine = load_machine(path, MachineConfig::default())?;
    print!("{}", StateDump(&machine));
    Ok(ExitCode::SUCCESS)
}
