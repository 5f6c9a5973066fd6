//! CPU core implementation.
//!
//! Holds the architectural state (register files, CSR file, memory,
//! LR/SC reservation) and the single-instruction `step` that drives it
//! (spec components C2-C9, minus the run loop which lives in `sim`).

/// Integer ALU operations (spec §4.4 OP/OP-IMM/OP-32/OP-IMM-32, M extension).
pub mod alu;

/// Control and Status Register file (spec component C3).
pub mod csr;

/// The CPU struct tying every component together and the `step` entry point.
pub mod cpu;

/// Per-instruction-family execution (spec component C7).
pub mod execute;

/// Floating-point arithmetic unit (spec §4.4 F/D extension).
pub mod fpu;

/// Flat byte-addressable memory (spec component C2).
pub mod memory;

/// Integer and floating-point register files (spec component C4).
pub mod regfile;

/// Single-slot load-reservation tracking for LR/SC (spec component C5).
pub mod reservation;

/// The guest syscall bridge (spec component C8).
pub mod syscall;

pub use cpu::Cpu;
