//! C-extension handlers.
//!
//! Every compressed instruction is a syntactic alias of one base
//! instruction with a reduced register field (3-bit, x8-x15) or an
//! implicit operand (SP, x1), so most handlers decode the compressed
//! fields and delegate to the base family helpers with size 2.

use rv2c_core::trap::CAUSE_BREAKPOINT;
use rv2c_core::{CmpPred, TuBuilder};

use super::base::{op_add, op_and, op_ashr, op_lshr, op_or, op_shl, op_sub, op_xor};
use super::Rv32gcVm;
use crate::bitutil::{bit_sub, sign_extend};
use crate::Continuation;

// ── Compressed field extraction ──────────────────────────────────

/// rd'/rs2' (bits [4:2], mapped to x8-x15).
fn creg_lo(h: u32) -> u32 {
    bit_sub::<2, 3>(h) + 8
}

/// rs1'/rd' (bits [9:7], mapped to x8-x15).
fn creg_hi(h: u32) -> u32 {
    bit_sub::<7, 3>(h) + 8
}

/// Full-width rd/rs1 (bits [11:7]).
fn reg_full(h: u32) -> u32 {
    bit_sub::<7, 5>(h)
}

/// Full-width rs2 (bits [6:2]).
fn rs2_full(h: u32) -> u32 {
    bit_sub::<2, 5>(h)
}

// ── Compressed immediates ────────────────────────────────────────

/// CIW: scaled-by-4 zero-extended immediate of C.ADDI4SPN.
fn ciw_imm(h: u32) -> u32 {
    bit_sub::<7, 4>(h) << 6
        | bit_sub::<11, 2>(h) << 4
        | bit_sub::<5, 1>(h) << 3
        | bit_sub::<6, 1>(h) << 2
}

/// CL/CS word offset (C.LW, C.SW, C.FLW, C.FSW).
fn cl_w_off(h: u32) -> u32 {
    bit_sub::<10, 3>(h) << 3 | bit_sub::<6, 1>(h) << 2 | bit_sub::<5, 1>(h) << 6
}

/// CL/CS doubleword offset (C.FLD, C.FSD).
fn cl_d_off(h: u32) -> u32 {
    bit_sub::<10, 3>(h) << 3 | bit_sub::<5, 2>(h) << 6
}

/// CI 6-bit signed immediate.
fn ci_imm6(h: u32) -> i32 {
    sign_extend(bit_sub::<12, 1>(h) << 5 | bit_sub::<2, 5>(h), 6)
}

/// CI shift amount (6 raw bits; bit 5 is reserved on RV32).
fn ci_shamt(h: u32) -> u32 {
    bit_sub::<12, 1>(h) << 5 | bit_sub::<2, 5>(h)
}

/// C.ADDI16SP scaled immediate.
fn addi16sp_imm(h: u32) -> i32 {
    let raw = bit_sub::<12, 1>(h) << 9
        | bit_sub::<3, 2>(h) << 7
        | bit_sub::<5, 1>(h) << 6
        | bit_sub::<2, 1>(h) << 5
        | bit_sub::<6, 1>(h) << 4;
    sign_extend(raw, 10)
}

/// CJ target offset (C.J, C.JAL).
fn cj_off(h: u32) -> i32 {
    let raw = bit_sub::<12, 1>(h) << 11
        | bit_sub::<8, 1>(h) << 10
        | bit_sub::<9, 2>(h) << 8
        | bit_sub::<6, 1>(h) << 7
        | bit_sub::<7, 1>(h) << 6
        | bit_sub::<2, 1>(h) << 5
        | bit_sub::<11, 1>(h) << 4
        | bit_sub::<3, 3>(h) << 1;
    sign_extend(raw, 12)
}

/// CB branch offset (C.BEQZ, C.BNEZ).
fn cb_off(h: u32) -> i32 {
    let raw = bit_sub::<12, 1>(h) << 8
        | bit_sub::<5, 2>(h) << 6
        | bit_sub::<2, 1>(h) << 5
        | bit_sub::<10, 2>(h) << 3
        | bit_sub::<3, 2>(h) << 1;
    sign_extend(raw, 9)
}

/// C.LWSP/C.FLWSP offset.
fn lwsp_off(h: u32) -> u32 {
    bit_sub::<4, 3>(h) << 2 | bit_sub::<12, 1>(h) << 5 | bit_sub::<2, 2>(h) << 6
}

/// C.FLDSP offset.
fn ldsp_off(h: u32) -> u32 {
    bit_sub::<5, 2>(h) << 3 | bit_sub::<12, 1>(h) << 5 | bit_sub::<2, 3>(h) << 6
}

/// C.SWSP/C.FSWSP offset.
fn swsp_off(h: u32) -> u32 {
    bit_sub::<9, 4>(h) << 2 | bit_sub::<7, 2>(h) << 6
}

/// C.FSDSP offset.
fn sdsp_off(h: u32) -> u32 {
    bit_sub::<10, 3>(h) << 3 | bit_sub::<7, 3>(h) << 6
}

// ── Quadrant 0 ───────────────────────────────────────────────────

pub(crate) fn c_addi4spn(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let rd = creg_lo(insn);
    let uimm = ciw_imm(insn);
    let cur_pc_val = vm.begin_insn("C_ADDI4SPN", pc, 2, insn);
    if uimm == 0 {
        vm.gen_illegal(&cur_pc_val);
        return vm.end_term(Continuation::Branch);
    }
    let sp = vm.xload(2);
    let off = vm.tu().constant(uimm as u64, 32);
    let sum = vm.tu_ref().add(&sp, &off);
    let sum = vm.tu().assignment(sum, 32);
    vm.xstore(rd, &sum);
    vm.end_cont(*pc)
}

pub(crate) fn c_fld(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fload("C_FLD", pc, insn, 2, creg_lo(insn), creg_hi(insn), cl_d_off(insn) as i32, 64)
}

pub(crate) fn c_lw(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_load("C_LW", pc, insn, 2, creg_lo(insn), creg_hi(insn), cl_w_off(insn) as i32, 32, true)
}

pub(crate) fn c_flw(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fload("C_FLW", pc, insn, 2, creg_lo(insn), creg_hi(insn), cl_w_off(insn) as i32, 32)
}

pub(crate) fn c_fsd(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fstore("C_FSD", pc, insn, 2, creg_hi(insn), creg_lo(insn), cl_d_off(insn) as i32, 64)
}

pub(crate) fn c_sw(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_store("C_SW", pc, insn, 2, creg_hi(insn), creg_lo(insn), cl_w_off(insn) as i32, 32)
}

pub(crate) fn c_fsw(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fstore("C_FSW", pc, insn, 2, creg_hi(insn), creg_lo(insn), cl_w_off(insn) as i32, 32)
}

/// The designated illegal instruction (the all-zero halfword).
pub(crate) fn dii(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let cur_pc_val = vm.begin_insn("DII", pc, 2, insn);
    vm.gen_illegal(&cur_pc_val);
    vm.end_term(Continuation::Branch)
}

// ── Quadrant 1 ───────────────────────────────────────────────────

pub(crate) fn c_addi(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let r = reg_full(insn);
    vm.gen_arith_imm("C_ADDI", pc, insn, 2, r, r, ci_imm6(insn), op_add)
}

pub(crate) fn c_nop(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.begin_insn("C_NOP", pc, 2, insn);
    vm.end_cont(*pc)
}

pub(crate) fn c_jal(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_jal("C_JAL", pc, insn, 2, 1, cj_off(insn))
}

pub(crate) fn c_li(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let rd = reg_full(insn);
    let imm = ci_imm6(insn);
    let cur_pc_val = vm.begin_insn("C_LI", pc, 2, insn);
    if rd == 0 {
        vm.gen_illegal(&cur_pc_val);
        return vm.end_term(Continuation::Branch);
    }
    let v = vm.tu().constant(imm as u32 as u64, 32);
    vm.xstore(rd, &v);
    vm.end_cont(*pc)
}

pub(crate) fn c_lui(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let rd = reg_full(insn);
    let imm6 = ci_imm6(insn);
    let cur_pc_val = vm.begin_insn("C_LUI", pc, 2, insn);
    if rd == 0 || imm6 == 0 {
        vm.gen_illegal(&cur_pc_val);
        return vm.end_term(Continuation::Branch);
    }
    let v = vm.tu().constant((imm6 << 12) as u32 as u64, 32);
    vm.xstore(rd, &v);
    vm.end_cont(*pc)
}

pub(crate) fn c_addi16sp(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_arith_imm("C_ADDI16SP", pc, insn, 2, 2, 2, addi16sp_imm(insn), op_add)
}

pub(crate) fn c_srli(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let r = creg_hi(insn);
    vm.gen_shift_imm("C_SRLI", pc, insn, 2, r, r, ci_shamt(insn), op_lshr)
}

pub(crate) fn c_srai(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let r = creg_hi(insn);
    vm.gen_shift_imm("C_SRAI", pc, insn, 2, r, r, ci_shamt(insn), op_ashr)
}

pub(crate) fn c_andi(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let r = creg_hi(insn);
    vm.gen_arith_imm("C_ANDI", pc, insn, 2, r, r, ci_imm6(insn), op_and)
}

pub(crate) fn c_sub(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let r = creg_hi(insn);
    vm.gen_arith_rr("C_SUB", pc, insn, 2, r, r, creg_lo(insn), op_sub)
}

pub(crate) fn c_xor(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let r = creg_hi(insn);
    vm.gen_arith_rr("C_XOR", pc, insn, 2, r, r, creg_lo(insn), op_xor)
}

pub(crate) fn c_or(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let r = creg_hi(insn);
    vm.gen_arith_rr("C_OR", pc, insn, 2, r, r, creg_lo(insn), op_or)
}

pub(crate) fn c_and(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let r = creg_hi(insn);
    vm.gen_arith_rr("C_AND", pc, insn, 2, r, r, creg_lo(insn), op_and)
}

pub(crate) fn c_j(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_jal("C_J", pc, insn, 2, 0, cj_off(insn))
}

pub(crate) fn c_beqz(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_branch("C_BEQZ", pc, insn, 2, creg_hi(insn), 0, cb_off(insn), CmpPred::Eq)
}

pub(crate) fn c_bnez(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_branch("C_BNEZ", pc, insn, 2, creg_hi(insn), 0, cb_off(insn), CmpPred::Ne)
}

// ── Quadrant 2 ───────────────────────────────────────────────────

pub(crate) fn c_slli(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let rd = reg_full(insn);
    let shamt = ci_shamt(insn);
    if rd == 0 {
        let cur_pc_val = vm.begin_insn("C_SLLI", pc, 2, insn);
        vm.gen_illegal(&cur_pc_val);
        return vm.end_term(Continuation::Branch);
    }
    vm.gen_shift_imm("C_SLLI", pc, insn, 2, rd, rd, shamt, op_shl)
}

pub(crate) fn c_fldsp(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fload("C_FLDSP", pc, insn, 2, reg_full(insn), 2, ldsp_off(insn) as i32, 64)
}

pub(crate) fn c_lwsp(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_load("C_LWSP", pc, insn, 2, reg_full(insn), 2, lwsp_off(insn) as i32, 32, true)
}

pub(crate) fn c_flwsp(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fload("C_FLWSP", pc, insn, 2, reg_full(insn), 2, lwsp_off(insn) as i32, 32)
}

pub(crate) fn c_jr(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_jalr("C_JR", pc, insn, 2, 0, reg_full(insn), 0)
}

pub(crate) fn c_mv(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_arith_rr("C_MV", pc, insn, 2, reg_full(insn), 0, rs2_full(insn), op_add)
}

pub(crate) fn c_ebreak(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let cur_pc_val = vm.begin_insn("C_EBREAK", pc, 2, insn);
    vm.gen_raise_trap(&cur_pc_val, 0, CAUSE_BREAKPOINT);
    vm.end_term(Continuation::Branch)
}

pub(crate) fn c_jalr(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_jalr("C_JALR", pc, insn, 2, 1, reg_full(insn), 0)
}

pub(crate) fn c_add(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let rd = reg_full(insn);
    vm.gen_arith_rr("C_ADD", pc, insn, 2, rd, rd, rs2_full(insn), op_add)
}

pub(crate) fn c_fsdsp(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fstore("C_FSDSP", pc, insn, 2, 2, rs2_full(insn), sdsp_off(insn) as i32, 64)
}

pub(crate) fn c_swsp(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_store("C_SWSP", pc, insn, 2, 2, rs2_full(insn), swsp_off(insn) as i32, 32)
}

pub(crate) fn c_fswsp(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fstore("C_FSWSP", pc, insn, 2, 2, rs2_full(insn), swsp_off(insn) as i32, 32)
}
