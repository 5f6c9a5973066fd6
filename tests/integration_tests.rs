//! End-to-end tests driving the full fetch-decode-execute pipeline
//! (spec §8, concrete scenarios), rather than calling `execute`/`fpu`
//! helpers directly.

use rv64_sim::core::csr::{fflags, FFLAGS};
use rv64_sim::core::syscall::HostSyscalls;
use rv64_sim::core::Cpu;
use rv64_sim::isa::opcodes::*;
use rv64_sim::sim::run::{run, RunOutcome};

fn u_type(imm20: u32, rd: u32, opcode: u32) -> u32 {
    (imm20 << 12) | (rd << 7) | opcode
}

fn i_type(imm: u32, rs1: u32, funct3: u32, rd: u32, opcode: u32) -> u32 {
    ((imm & 0xfff) << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | opcode
}

fn r_type(funct7: u32, rs2: u32, rs1: u32, funct3: u32, rd: u32, opcode: u32) -> u32 {
    (funct7 << 25) | (rs2 << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | opcode
}

/// Scenario 1: LUI + ADDI build a value in a register, then ECALL with
/// a7=93 (exit) and a0 carrying the status exits the guest.
#[test]
fn lui_addi_ecall_exits_with_status() {
    let mut cpu = Cpu::new(4096, false);
    // lui a0, 0          -> a0 = 0
    cpu.memory.write_u32(0, u_type(0, 10, LUI)).unwrap();
    // addi a0, a0, 7     -> a0 = 7
    cpu.memory.write_u32(4, i_type(7, 10, alu_f3::ADD_SUB, 10, OP_IMM)).unwrap();
    // addi a7, x0, 93    -> a7 = SYS_EXIT
    cpu.memory.write_u32(8, i_type(93, 0, alu_f3::ADD_SUB, 17, OP_IMM)).unwrap();
    // ecall
    cpu.memory.write_u32(12, i_type(ECALL_FUNCT12, 0, system_f3::PRIV, 0, SYSTEM)).unwrap();

    let mut handler = HostSyscalls::default();
    match run(&mut cpu, &mut handler, -1).unwrap() {
        RunOutcome::Exited(status) => assert_eq!(status, 7),
        RunOutcome::BudgetExhausted => panic!("expected exit"),
    }
}

/// Scenarios 3-4: a matching LR.D/SC.D pair succeeds through the full
/// pipeline, and a second SC.D to the same address (reservation already
/// cleared) fails.
#[test]
fn lr_sc_through_full_pipeline() {
    let mut cpu = Cpu::new(4096, false);
    cpu.memory.write_u64(0x100, 41).unwrap();
    cpu.int.write(10, 0x100); // a0 = address
    cpu.int.write(11, 42); // a1 = new value

    // lr.d a2, (a0)
    cpu.memory.write_u32(0, r_type(amo_f5::LR << 2, 0, 10, mem_f3::D, 12, AMO)).unwrap();
    // sc.d a3, a1, (a0)
    cpu.memory.write_u32(4, r_type(amo_f5::SC << 2, 11, 10, mem_f3::D, 13, AMO)).unwrap();
    // sc.d a4, a1, (a0)  -- reservation already consumed, must fail
    cpu.memory.write_u32(8, r_type(amo_f5::SC << 2, 11, 10, mem_f3::D, 14, AMO)).unwrap();
    // addi a7, x0, 93 ; ecall
    cpu.memory.write_u32(12, i_type(93, 0, alu_f3::ADD_SUB, 17, OP_IMM)).unwrap();
    cpu.memory.write_u32(16, i_type(ECALL_FUNCT12, 0, system_f3::PRIV, 0, SYSTEM)).unwrap();

    let mut handler = HostSyscalls::default();
    run(&mut cpu, &mut handler, -1).unwrap();

    assert_eq!(cpu.int.read(13), 0); // first sc succeeded
    assert_eq!(cpu.int.read(14), 1); // second sc failed, no reservation
    assert_eq!(cpu.memory.read_u64(0x100).unwrap(), 42);
}

/// Scenario 6: FDIV.S by exact zero through the full pipeline sets DZ
/// in fcsr and produces positive infinity.
#[test]
fn float_divide_by_zero_through_full_pipeline() {
    let mut cpu = Cpu::new(4096, false);
    cpu.float.write_f32(1, 2.0);
    cpu.float.write_f32(2, 0.0);
    // fdiv.s f3, f1, f2
    cpu.memory.write_u32(0, r_type(fp_f7::DIV_S, 2, 1, 0, 3, OP_FP)).unwrap();
    // addi a7, x0, 93 ; ecall
    cpu.memory.write_u32(4, i_type(93, 0, alu_f3::ADD_SUB, 17, OP_IMM)).unwrap();
    cpu.memory.write_u32(8, i_type(ECALL_FUNCT12, 0, system_f3::PRIV, 0, SYSTEM)).unwrap();

    let mut handler = HostSyscalls::default();
    run(&mut cpu, &mut handler, -1).unwrap();

    let result = cpu.float.read_f32(3);
    assert!(result.is_infinite() && result.is_sign_positive());
    assert_eq!(cpu.csrs.get(FFLAGS), fflags::DZ);
}

/// An unhandled trap leaves the PC at the faulting instruction, not past it.
#[test]
fn fatal_trap_reports_faulting_pc() {
    let mut cpu = Cpu::new(4096, false);
    cpu.memory.write_u32(0, 0b1111111).unwrap(); // not a valid base opcode
    let mut handler = HostSyscalls::default();
    let err = run(&mut cpu, &mut handler, -1).unwrap_err();
    assert_eq!(err.pc, 0);
}
