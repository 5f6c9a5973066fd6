//! Trap taxonomy surfaced by the execute stage (spec §7).
//!
//! The three fatal kinds are instruction malformation, fetch/branch
//! misalignment, and memory bounds violations. `Exit` is not a trap in
//! the ISA sense; it is how the syscall bridge (C8) tells the run loop
//! (C9) the guest program is done.

use std::fmt;

/// A fault raised by the execute stage.
///
/// Every variant is fatal to the current `step`: the PC is left
/// pointing at the faulting instruction and no register or memory
/// mutation from that instruction is retained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trap {
    /// A taken branch/jump target violated the current ISA's minimum
    /// instruction alignment (2 bytes with C enabled, else 4).
    MisalignedInstructionFetch,
    /// The fetched word does not correspond to any instruction this
    /// simulator implements, or encodes a reserved bit pattern (e.g. a
    /// W-shift with shamt bit 5 set).
    AbnormalInstruction,
    /// A load, store, or instruction fetch addressed bytes outside
    /// `[0, memory_size)`.
    MemoryFault,
}

impl fmt::Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Trap::MisalignedInstructionFetch => "misaligned instruction fetch",
            Trap::AbnormalInstruction => "abnormal instruction",
            Trap::MemoryFault => "memory fault",
        };
        write!(f, "{}", msg)
    }
}

impl std::error::Error for Trap {}

/// A `Trap` paired with the PC at which it was raised, as reported by
/// the run loop (C9) to its caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FatalTrap {
    pub trap: Trap,
    pub pc: u64,
}

impl fmt::Display for FatalTrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at pc={:#018x}", self.trap, self.pc)
    }
}

impl std::error::Error for FatalTrap {}
