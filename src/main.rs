//! RV64 instruction set simulator CLI.
//!
//! Loads a statically-linked RV64 ELF, runs it to completion (or until
//! a step budget is exhausted), and exits with the guest's exit status.

use std::{fs, process};

use clap::Parser;
use serde::Serialize;

use rv64_sim::config::Config;
use rv64_sim::core::syscall::HostSyscalls;
use rv64_sim::core::Cpu;
use rv64_sim::sim::{loader, run, RunOutcome};

/// Command-line arguments for the RISC-V instruction set simulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "RV64IMAFDC instruction set simulator")]
struct Args {
    /// Path to a statically-linked RV64 ELF binary.
    elf: String,

    /// Step budget; negative means run until exit or trap.
    #[arg(long, default_value_t = -1)]
    steps: i64,

    /// Trace every retired instruction to stderr.
    #[arg(short, long)]
    trace: bool,

    /// Optional TOML config overriding memory size / stack size / the C extension.
    #[arg(short, long)]
    config: Option<String>,

    /// Write final PC, integer registers, and exit status as JSON to this path.
    #[arg(long)]
    dump_json: Option<String>,

    /// Extra arguments forwarded to the guest's argv (after the ELF path).
    #[arg(trailing_var_arg = true)]
    guest_args: Vec<String>,
}

#[derive(Serialize)]
struct FinalState {
    pc: u64,
    int_regs: [u64; 32],
    exit_status: i64,
}

fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let content = fs::read_to_string(path).expect("failed to read config file");
            toml::from_str(&content).expect("failed to parse config file")
        }
        None => Config::default(),
    };

    let image = fs::read(&args.elf).expect("failed to read ELF file");

    let mut cpu = Cpu::new(config.memory_size, config.compressed_enabled);
    cpu.trace = args.trace;

    let entry = loader::load_elf(&mut cpu.memory, &image).expect("failed to load ELF");
    cpu.pc = entry;

    let mut guest_argv = vec![args.elf.clone()];
    guest_argv.extend(args.guest_args.iter().cloned());
    let sp = loader::build_initial_stack(&mut cpu.memory, config.memory_size as u64, &guest_argv, &[])
        .expect("failed to lay out initial stack");
    cpu.int.write(2, sp);

    let mut handler = HostSyscalls::default();
    let outcome = run::run(&mut cpu, &mut handler, args.steps);

    if let Some(path) = &args.dump_json {
        let exit_status = match &outcome {
            Ok(RunOutcome::Exited(status)) => *status,
            _ => -1,
        };
        let mut int_regs = [0u64; 32];
        for (i, slot) in int_regs.iter_mut().enumerate() {
            *slot = cpu.int.read(i);
        }
        let state = FinalState { pc: cpu.pc, int_regs, exit_status };
        let json = serde_json::to_string_pretty(&state).expect("failed to serialize final state");
        fs::write(path, json).expect("failed to write dump file");
    }

    match outcome {
        Ok(RunOutcome::Exited(status)) => {
            println!("[*] Exited with status {status}");
            process::exit(status as i32);
        }
        Ok(RunOutcome::BudgetExhausted) => {
            println!("[*] Step budget exhausted at pc={:#018x}", cpu.pc);
            process::exit(0);
        }
        Err(fatal) => {
            eprintln!("[!] FATAL TRAP: {fatal}");
            process::exit(1);
        }
    }
}
