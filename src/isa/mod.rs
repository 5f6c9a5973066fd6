//! Instruction Set Architecture definitions and the decoder.
//!
//! Implements RV64IMAFDC instruction decoding: opcode/funct tables,
//! the six immediate encodings, compressed-instruction expansion, and
//! the `Instruction` sum type the executor (`core::execute`) consumes.

/// Raw opcode, funct3, funct5, funct7, and syscall ABI constants.
pub mod opcodes;

/// Length detection, immediate decoding, and the decode dispatch tree.
pub mod decode;

pub use decode::{decode, Instruction};
