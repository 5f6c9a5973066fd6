//! Per-instruction-family execution (spec component C7, §4.4).
//!
//! `execute` consumes one decoded `Instruction` and mutates the CPU's
//! architectural state, returning how the PC should move next. Splitting
//! decode (`isa::decode`) from execute keeps the semantics in one place
//! per spec §9's redesign guidance, instead of the interleaved
//! fetch/decode/execute the reference implementation used for throughput.

use crate::common::error::Trap;
use crate::core::alu;
use crate::core::cpu::Cpu;
use crate::core::fpu;
use crate::core::syscall::SyscallHandler;
use crate::isa::decode::{
    AmoKind, BranchKind, CsrKind, CsrSrc, FBinOp, FmaKind, Instruction, SgnjKind, Width,
};

/// How the just-executed instruction wants the PC to move.
pub enum Outcome {
    /// Advance by the instruction's own length (2 or 4 bytes).
    Next,
    /// Jump unconditionally to this absolute address (branches taken,
    /// JAL, JALR); alignment is checked by the caller.
    Jump(u64),
    /// The syscall bridge signaled guest exit; PC does not move.
    Exit,
}

fn se8(v: u8) -> u64 {
    v as i8 as i64 as u64
}
fn se16(v: u16) -> u64 {
    v as i16 as i64 as u64
}
fn se32(v: u32) -> u64 {
    v as i32 as i64 as u64
}

pub fn execute(
    cpu: &mut Cpu,
    instr: Instruction,
    handler: &mut dyn SyscallHandler,
) -> Result<Outcome, Trap> {
    use crate::isa::decode::LoadKind;

    match instr {
        Instruction::Lui { rd, imm } => {
            cpu.int.write(rd, imm);
            Ok(Outcome::Next)
        }
        Instruction::Auipc { rd, imm } => {
            cpu.int.write(rd, cpu.pc.wrapping_add(imm));
            Ok(Outcome::Next)
        }
        Instruction::Jal { rd, imm } => {
            cpu.int.write(rd, cpu.pc.wrapping_add(4));
            Ok(Outcome::Jump(cpu.pc.wrapping_add(imm)))
        }
        Instruction::Jalr { rd, rs1, imm } => {
            let target = cpu.int.read(rs1).wrapping_add(imm) & !1u64;
            cpu.int.write(rd, cpu.pc.wrapping_add(4));
            Ok(Outcome::Jump(target))
        }
        Instruction::Branch { kind, rs1, rs2, imm } => {
            let a = cpu.int.read(rs1);
            let b = cpu.int.read(rs2);
            let taken = match kind {
                BranchKind::Eq => a == b,
                BranchKind::Ne => a != b,
                BranchKind::Lt => (a as i64) < (b as i64),
                BranchKind::Ge => (a as i64) >= (b as i64),
                BranchKind::Ltu => a < b,
                BranchKind::Geu => a >= b,
            };
            if taken {
                Ok(Outcome::Jump(cpu.pc.wrapping_add(imm)))
            } else {
                Ok(Outcome::Next)
            }
        }
        Instruction::Load { kind, rd, rs1, imm } => {
            let addr = cpu.int.read(rs1).wrapping_add(imm);
            let value = match kind {
                LoadKind::B => se8(cpu.memory.read_u8(addr)?),
                LoadKind::H => se16(cpu.memory.read_u16(addr)?),
                LoadKind::W => se32(cpu.memory.read_u32(addr)?),
                LoadKind::D => cpu.memory.read_u64(addr)?,
                LoadKind::Bu => cpu.memory.read_u8(addr)? as u64,
                LoadKind::Hu => cpu.memory.read_u16(addr)? as u64,
                LoadKind::Wu => cpu.memory.read_u32(addr)? as u64,
            };
            cpu.int.write(rd, value);
            Ok(Outcome::Next)
        }
        Instruction::Store { width, rs1, rs2, imm } => {
            let addr = cpu.int.read(rs1).wrapping_add(imm);
            let value = cpu.int.read(rs2);
            match width {
                Width::Byte => cpu.memory.write_u8(addr, value as u8)?,
                Width::Half => cpu.memory.write_u16(addr, value as u16)?,
                Width::Word => cpu.memory.write_u32(addr, value as u32)?,
                Width::Double => cpu.memory.write_u64(addr, value)?,
            }
            Ok(Outcome::Next)
        }
        Instruction::AluImm { op, rd, rs1, imm, word } => {
            let a = cpu.int.read(rs1);
            cpu.int.write(rd, alu::execute(op, a, imm, word));
            Ok(Outcome::Next)
        }
        Instruction::AluReg { op, rd, rs1, rs2, word } => {
            let a = cpu.int.read(rs1);
            let b = cpu.int.read(rs2);
            cpu.int.write(rd, alu::execute(op, a, b, word));
            Ok(Outcome::Next)
        }
        Instruction::Fence | Instruction::FenceI => Ok(Outcome::Next),
        Instruction::Ecall => {
            let retired = handler.call(cpu)?;
            if retired == 0 {
                Ok(Outcome::Exit)
            } else {
                Ok(Outcome::Next)
            }
        }
        Instruction::Ebreak => Ok(Outcome::Next),
        Instruction::Csr { kind, rd, src, csr: index } => {
            let old = cpu.csrs.get(index);
            cpu.int.write(rd, old);
            let (operand, is_zero) = match src {
                CsrSrc::Reg(r) => (cpu.int.read(r), r == 0),
                CsrSrc::Imm(i) => (i as u64, i == 0),
            };
            let skip_write = is_zero && matches!(kind, CsrKind::Rs | CsrKind::Rc);
            if !skip_write {
                let new = match kind {
                    CsrKind::Rw => operand,
                    CsrKind::Rs => old | operand,
                    CsrKind::Rc => old & !operand,
                };
                cpu.csrs.set(index, new);
            }
            Ok(Outcome::Next)
        }
        Instruction::Amo { op, width, rd, rs1, rs2 } => execute_amo(cpu, op, width, rd, rs1, rs2),
        Instruction::FLoad { width, rd, rs1, imm } => {
            let addr = cpu.int.read(rs1).wrapping_add(imm);
            match width {
                Width::Word => {
                    let bits = cpu.memory.read_u32(addr)?;
                    cpu.float.write_f32_bits(rd, bits);
                }
                Width::Double => {
                    let bits = cpu.memory.read_u64(addr)?;
                    cpu.float.write_f64_bits(rd, bits);
                }
                _ => return Err(Trap::AbnormalInstruction),
            }
            Ok(Outcome::Next)
        }
        Instruction::FStore { width, rs1, rs2, imm } => {
            let addr = cpu.int.read(rs1).wrapping_add(imm);
            match width {
                Width::Word => cpu.memory.write_u32(addr, cpu.float.read_f32_bits(rs2))?,
                Width::Double => cpu.memory.write_u64(addr, cpu.float.read_f64_bits(rs2))?,
                _ => return Err(Trap::AbnormalInstruction),
            }
            Ok(Outcome::Next)
        }
        Instruction::FBinary { op, rd, rs1, rs2, double } => {
            execute_fbinary(cpu, op, rd, rs1, rs2, double);
            Ok(Outcome::Next)
        }
        Instruction::FSqrt { rd, rs1, double } => {
            execute_fsqrt(cpu, rd, rs1, double);
            Ok(Outcome::Next)
        }
        Instruction::FSgnj { kind, rd, rs1, rs2, double } => {
            execute_fsgnj(cpu, kind, rd, rs1, rs2, double);
            Ok(Outcome::Next)
        }
        Instruction::FMinMax { is_max, rd, rs1, rs2, double } => {
            execute_fminmax(cpu, is_max, rd, rs1, rs2, double);
            Ok(Outcome::Next)
        }
        Instruction::FCmp { kind, rd, rs1, rs2, double } => {
            execute_fcmp(cpu, kind, rd, rs1, rs2, double);
            Ok(Outcome::Next)
        }
        Instruction::FCvtToInt { rd, rs1, src_double, dst_unsigned, dst64 } => {
            execute_fcvt_to_int(cpu, rd, rs1, src_double, dst_unsigned, dst64);
            Ok(Outcome::Next)
        }
        Instruction::FCvtFromInt { rd, rs1, dst_double, src_unsigned, src64 } => {
            execute_fcvt_from_int(cpu, rd, rs1, dst_double, src_unsigned, src64);
            Ok(Outcome::Next)
        }
        Instruction::FCvtPrecision { rd, rs1, to_double } => {
            execute_fcvt_precision(cpu, rd, rs1, to_double);
            Ok(Outcome::Next)
        }
        Instruction::FMvToInt { rd, rs1, double } => {
            let bits = if double {
                cpu.float.read_f64_bits(rs1)
            } else {
                se32(cpu.float.read_f32_bits(rs1))
            };
            cpu.int.write(rd, bits);
            Ok(Outcome::Next)
        }
        Instruction::FMvFromInt { rd, rs1, double } => {
            let bits = cpu.int.read(rs1);
            if double {
                cpu.float.write_f64_bits(rd, bits);
            } else {
                cpu.float.write_f32_bits(rd, bits as u32);
            }
            Ok(Outcome::Next)
        }
        Instruction::FClass { rd, rs1, double } => {
            let mask = if double {
                fpu::fclass_d(cpu.float.read_f64(rs1))
            } else {
                fpu::fclass_s(cpu.float.read_f32(rs1))
            };
            cpu.int.write(rd, mask);
            Ok(Outcome::Next)
        }
        Instruction::Fma { kind, rd, rs1, rs2, rs3, double } => {
            execute_fma(cpu, kind, rd, rs1, rs2, rs3, double);
            Ok(Outcome::Next)
        }
    }
}

fn execute_amo(
    cpu: &mut Cpu,
    op: AmoKind,
    width: Width,
    rd: usize,
    rs1: usize,
    rs2: usize,
) -> Result<Outcome, Trap> {
    let addr = cpu.int.read(rs1);
    match op {
        AmoKind::Lr => {
            let value = match width {
                Width::Word => se32(cpu.memory.read_u32(addr)?),
                Width::Double => cpu.memory.read_u64(addr)?,
                _ => return Err(Trap::AbnormalInstruction),
            };
            cpu.reservation.set(addr);
            cpu.int.write(rd, value);
        }
        AmoKind::Sc => {
            let success = cpu.reservation.check_and_clear(addr);
            if success {
                let value = cpu.int.read(rs2);
                match width {
                    Width::Word => cpu.memory.write_u32(addr, value as u32)?,
                    Width::Double => cpu.memory.write_u64(addr, value)?,
                    _ => return Err(Trap::AbnormalInstruction),
                }
            }
            cpu.int.write(rd, if success { 0 } else { 1 });
        }
        _ => {
            let rhs = cpu.int.read(rs2);
            match width {
                Width::Word => {
                    let old = cpu.memory.read_u32(addr)?;
                    let new = amo_combine_word(op, old, rhs as u32);
                    cpu.memory.write_u32(addr, new)?;
                    cpu.int.write(rd, se32(old));
                }
                Width::Double => {
                    let old = cpu.memory.read_u64(addr)?;
                    let new = amo_combine_double(op, old, rhs);
                    cpu.memory.write_u64(addr, new)?;
                    cpu.int.write(rd, old);
                }
                _ => return Err(Trap::AbnormalInstruction),
            }
        }
    }
    Ok(Outcome::Next)
}

fn amo_combine_word(op: AmoKind, old: u32, rhs: u32) -> u32 {
    match op {
        AmoKind::Swap => rhs,
        AmoKind::Add => old.wrapping_add(rhs),
        AmoKind::Xor => old ^ rhs,
        AmoKind::And => old & rhs,
        AmoKind::Or => old | rhs,
        AmoKind::Min => {
            if (old as i32) < (rhs as i32) {
                old
            } else {
                rhs
            }
        }
        AmoKind::Max => {
            if (old as i32) > (rhs as i32) {
                old
            } else {
                rhs
            }
        }
        AmoKind::Minu => old.min(rhs),
        AmoKind::Maxu => old.max(rhs),
        AmoKind::Lr | AmoKind::Sc => unreachable!("handled by caller"),
    }
}

fn amo_combine_double(op: AmoKind, old: u64, rhs: u64) -> u64 {
    match op {
        AmoKind::Swap => rhs,
        AmoKind::Add => old.wrapping_add(rhs),
        AmoKind::Xor => old ^ rhs,
        AmoKind::And => old & rhs,
        AmoKind::Or => old | rhs,
        AmoKind::Min => {
            if (old as i64) < (rhs as i64) {
                old
            } else {
                rhs
            }
        }
        AmoKind::Max => {
            if (old as i64) > (rhs as i64) {
                old
            } else {
                rhs
            }
        }
        AmoKind::Minu => old.min(rhs),
        AmoKind::Maxu => old.max(rhs),
        AmoKind::Lr | AmoKind::Sc => unreachable!("handled by caller"),
    }
}

fn execute_fbinary(cpu: &mut Cpu, op: FBinOp, rd: usize, rs1: usize, rs2: usize, double: bool) {
    cpu.csrs.clear_fflags();
    if double {
        let a = cpu.float.read_f64(rs1);
        let b = cpu.float.read_f64(rs2);
        let (r, flags) = match op {
            FBinOp::Add => fpu::fadd_d(a, b),
            FBinOp::Sub => fpu::fsub_d(a, b),
            FBinOp::Mul => fpu::fmul_d(a, b),
            FBinOp::Div => fpu::fdiv_d(a, b),
        };
        cpu.float.write_f64(rd, r);
        cpu.csrs.set_fflags(flags);
    } else {
        let a = cpu.float.read_f32(rs1);
        let b = cpu.float.read_f32(rs2);
        let (r, flags) = match op {
            FBinOp::Add => fpu::fadd_s(a, b),
            FBinOp::Sub => fpu::fsub_s(a, b),
            FBinOp::Mul => fpu::fmul_s(a, b),
            FBinOp::Div => fpu::fdiv_s(a, b),
        };
        cpu.float.write_f32(rd, r);
        cpu.csrs.set_fflags(flags);
    }
}

fn execute_fsqrt(cpu: &mut Cpu, rd: usize, rs1: usize, double: bool) {
    cpu.csrs.clear_fflags();
    if double {
        let (r, flags) = fpu::fsqrt_d(cpu.float.read_f64(rs1));
        cpu.float.write_f64(rd, r);
        cpu.csrs.set_fflags(flags);
    } else {
        let (r, flags) = fpu::fsqrt_s(cpu.float.read_f32(rs1));
        cpu.float.write_f32(rd, r);
        cpu.csrs.set_fflags(flags);
    }
}

/// Sign-injection, move, and classify instructions don't signal any FP
/// exception and leave `fflags` untouched, per the ISA manual (the
/// "clear at entry" contract applies to the arithmetic families only).
fn execute_fsgnj(cpu: &mut Cpu, kind: SgnjKind, rd: usize, rs1: usize, rs2: usize, double: bool) {
    if double {
        let r = fpu::fsgnj_d(kind, cpu.float.read_f64(rs1), cpu.float.read_f64(rs2));
        cpu.float.write_f64(rd, r);
    } else {
        let r = fpu::fsgnj_s(kind, cpu.float.read_f32(rs1), cpu.float.read_f32(rs2));
        cpu.float.write_f32(rd, r);
    }
}

fn execute_fminmax(cpu: &mut Cpu, is_max: bool, rd: usize, rs1: usize, rs2: usize, double: bool) {
    cpu.csrs.clear_fflags();
    if double {
        let (r, flags) = fpu::fminmax_d(is_max, cpu.float.read_f64(rs1), cpu.float.read_f64(rs2));
        cpu.float.write_f64(rd, r);
        cpu.csrs.set_fflags(flags);
    } else {
        let (r, flags) = fpu::fminmax_s(is_max, cpu.float.read_f32(rs1), cpu.float.read_f32(rs2));
        cpu.float.write_f32(rd, r);
        cpu.csrs.set_fflags(flags);
    }
}

fn execute_fcmp(
    cpu: &mut Cpu,
    kind: crate::isa::decode::CmpKind,
    rd: usize,
    rs1: usize,
    rs2: usize,
    double: bool,
) {
    cpu.csrs.clear_fflags();
    let (result, flags) = if double {
        fpu::fcmp_d(kind, cpu.float.read_f64(rs1), cpu.float.read_f64(rs2))
    } else {
        fpu::fcmp_s(kind, cpu.float.read_f32(rs1), cpu.float.read_f32(rs2))
    };
    cpu.int.write(rd, result);
    cpu.csrs.set_fflags(flags);
}

fn execute_fcvt_to_int(
    cpu: &mut Cpu,
    rd: usize,
    rs1: usize,
    src_double: bool,
    dst_unsigned: bool,
    dst64: bool,
) {
    cpu.csrs.clear_fflags();
    let (value, is_nan, is_signaling) = if src_double {
        let v = cpu.float.read_f64(rs1);
        let sig = v.is_nan() && v.to_bits() & 0x0008_0000_0000_0000 == 0;
        (v, v.is_nan(), sig)
    } else {
        let v = cpu.float.read_f32(rs1);
        let sig = v.is_nan() && v.to_bits() & 0x0040_0000 == 0;
        (v as f64, v.is_nan(), sig)
    };
    let (result, flags) = fpu::fcvt_to_int(value, dst_unsigned, dst64, is_nan, is_signaling);
    cpu.int.write(rd, result);
    cpu.csrs.set_fflags(flags);
}

fn execute_fcvt_from_int(
    cpu: &mut Cpu,
    rd: usize,
    rs1: usize,
    dst_double: bool,
    src_unsigned: bool,
    src64: bool,
) {
    cpu.csrs.clear_fflags();
    let full = cpu.int.read(rs1);
    let raw = if src64 {
        full
    } else if src_unsigned {
        full as u32 as u64
    } else {
        full as u32 as i32 as i64 as u64
    };
    let (bits, flags) = fpu::fcvt_from_int(raw, src_unsigned, dst_double);
    if dst_double {
        cpu.float.write_f64_bits(rd, bits);
    } else {
        cpu.float.write_f32_bits(rd, bits as u32);
    }
    cpu.csrs.set_fflags(flags);
}

fn execute_fcvt_precision(cpu: &mut Cpu, rd: usize, rs1: usize, to_double: bool) {
    cpu.csrs.clear_fflags();
    if to_double {
        let (r, flags) = fpu::fcvt_precision_d_s(cpu.float.read_f32(rs1));
        cpu.float.write_f64(rd, r);
        cpu.csrs.set_fflags(flags);
    } else {
        let (r, flags) = fpu::fcvt_precision_s_d(cpu.float.read_f64(rs1));
        cpu.float.write_f32(rd, r);
        cpu.csrs.set_fflags(flags);
    }
}

fn execute_fma(
    cpu: &mut Cpu,
    kind: FmaKind,
    rd: usize,
    rs1: usize,
    rs2: usize,
    rs3: usize,
    double: bool,
) {
    cpu.csrs.clear_fflags();
    if double {
        let a = cpu.float.read_f64(rs1);
        let b = cpu.float.read_f64(rs2);
        let c = cpu.float.read_f64(rs3);
        let (r, flags) = fpu::fma_d(kind, a, b, c);
        cpu.float.write_f64(rd, r);
        cpu.csrs.set_fflags(flags);
    } else {
        let a = cpu.float.read_f32(rs1);
        let b = cpu.float.read_f32(rs2);
        let c = cpu.float.read_f32(rs3);
        let (r, flags) = fpu::fma_s(kind, a, b, c);
        cpu.float.write_f32(rd, r);
        cpu.csrs.set_fflags(flags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::syscall::StubSyscalls;

    fn new_cpu() -> Cpu {
        Cpu::new(65536, false)
    }

    #[test]
    fn lr_sc_success_then_failure_on_mismatch() {
        let mut cpu = new_cpu();
        cpu.memory.write_u64(0x100, 42).unwrap();
        cpu.int.write(10, 0x100);
        cpu.int.write(11, 0x200);

        let mut handler = StubSyscalls { calls: vec![], exit_status: None };
        execute(&mut cpu, Instruction::Amo { op: AmoKind::Lr, width: Width::Double, rd: 1, rs1: 10, rs2: 0 }, &mut handler).unwrap();
        assert_eq!(cpu.int.read(1), 42);

        cpu.int.write(2, 43);
        execute(&mut cpu, Instruction::Amo { op: AmoKind::Sc, width: Width::Double, rd: 3, rs1: 10, rs2: 2 }, &mut handler).unwrap();
        assert_eq!(cpu.int.read(3), 0);
        assert_eq!(cpu.memory.read_u64(0x100).unwrap(), 43);

        execute(&mut cpu, Instruction::Amo { op: AmoKind::Lr, width: Width::Double, rd: 1, rs1: 10, rs2: 0 }, &mut handler).unwrap();
        execute(&mut cpu, Instruction::Amo { op: AmoKind::Sc, width: Width::Double, rd: 3, rs1: 11, rs2: 2 }, &mut handler).unwrap();
        assert_eq!(cpu.int.read(3), 1);
    }

    #[test]
    fn jalr_clears_low_bit_of_target() {
        let mut cpu = new_cpu();
        cpu.pc = 0x40;
        cpu.int.write(5, 0x1001);
        let mut handler = StubSyscalls { calls: vec![], exit_status: None };
        match execute(&mut cpu, Instruction::Jalr { rd: 1, rs1: 5, imm: 0 }, &mut handler).unwrap() {
            Outcome::Jump(target) => assert_eq!(target, 0x1000),
            _ => panic!("expected jump"),
        }
        assert_eq!(cpu.int.read(1), 0x44);
    }
}
