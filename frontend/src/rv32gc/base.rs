//! RV32I base integer handlers, system instructions and CSR access.
//!
//! Repetitive semantics are factored into family helpers on the Vm
//! (`gen_arith_rr`, `gen_arith_imm`, `gen_branch`, ...), each
//! parameterised by a `BinOp` or a predicate. The compressed frontend
//! reuses the same helpers with its own decoded operands.

use rv2c_core::trap::{CAUSE_BREAKPOINT, CAUSE_ECALL_FROM_M};
use rv2c_core::{AddrSpace, CmpPred, TuBuilder, Value};

use super::Rv32gcVm;
use crate::bitutil::{bit_sub, sign_extend};
use crate::Continuation;

/// Binary expression node: `fn(tu, lhs, rhs) -> result`.
pub(crate) type BinOp = fn(&dyn TuBuilder, &Value, &Value) -> Value;

// ── Field and immediate extraction ───────────────────────────────

pub(crate) fn rd_of(insn: u32) -> u32 {
    bit_sub::<7, 5>(insn)
}

pub(crate) fn rs1_of(insn: u32) -> u32 {
    bit_sub::<15, 5>(insn)
}

pub(crate) fn rs2_of(insn: u32) -> u32 {
    bit_sub::<20, 5>(insn)
}

fn itype_imm(insn: u32) -> i32 {
    sign_extend(bit_sub::<20, 12>(insn), 12)
}

fn stype_imm(insn: u32) -> i32 {
    sign_extend(bit_sub::<25, 7>(insn) << 5 | bit_sub::<7, 5>(insn), 12)
}

fn btype_imm(insn: u32) -> i32 {
    let raw = bit_sub::<31, 1>(insn) << 12
        | bit_sub::<7, 1>(insn) << 11
        | bit_sub::<25, 6>(insn) << 5
        | bit_sub::<8, 4>(insn) << 1;
    sign_extend(raw, 13)
}

fn jtype_imm(insn: u32) -> i32 {
    let raw = bit_sub::<31, 1>(insn) << 20
        | bit_sub::<12, 8>(insn) << 12
        | bit_sub::<20, 1>(insn) << 11
        | bit_sub::<21, 10>(insn) << 1;
    sign_extend(raw, 21)
}

// ── Family helpers ───────────────────────────────────────────────

impl Rv32gcVm {
    /// R-type ALU: `rd = op(rs1, rs2)`.
    pub(crate) fn gen_arith_rr(
        &mut self,
        mnem: &str,
        pc: &mut u32,
        insn: u32,
        size: u32,
        rd: u32,
        rs1: u32,
        rs2: u32,
        op: BinOp,
    ) -> Continuation {
        self.begin_insn(mnem, pc, size, insn);
        if rd != 0 {
            let a = self.xload(rs1);
            let b = self.xload(rs2);
            let res = op(self.tu_ref(), &a, &b);
            let res = self.tu().assignment(res, 32);
            self.xstore(rd, &res);
        }
        self.end_cont(*pc)
    }

    /// I-type ALU: `rd = op(rs1, imm)`.
    pub(crate) fn gen_arith_imm(
        &mut self,
        mnem: &str,
        pc: &mut u32,
        insn: u32,
        size: u32,
        rd: u32,
        rs1: u32,
        imm: i32,
        op: BinOp,
    ) -> Continuation {
        self.begin_insn(mnem, pc, size, insn);
        if rd != 0 {
            let a = self.xload(rs1);
            let b = self.tu().constant(imm as u32 as u64, 32);
            let res = op(self.tu_ref(), &a, &b);
            let res = self.tu().assignment(res, 32);
            self.xstore(rd, &res);
        }
        self.end_cont(*pc)
    }

    /// R-type setcond: `rd = (rs1 pred rs2) ? 1 : 0`.
    pub(crate) fn gen_setcond_rr(
        &mut self,
        mnem: &str,
        pc: &mut u32,
        insn: u32,
        pred: CmpPred,
    ) -> Continuation {
        let (rd, rs1, rs2) = (rd_of(insn), rs1_of(insn), rs2_of(insn));
        self.begin_insn(mnem, pc, 4, insn);
        if rd != 0 {
            let a = self.xload(rs1);
            let b = self.xload(rs2);
            let res = self.tu_ref().icmp(pred, &a, &b);
            let res = self.tu().assignment(res, 32);
            self.xstore(rd, &res);
        }
        self.end_cont(*pc)
    }

    /// I-type setcond: `rd = (rs1 pred imm) ? 1 : 0`.
    pub(crate) fn gen_setcond_imm(
        &mut self,
        mnem: &str,
        pc: &mut u32,
        insn: u32,
        pred: CmpPred,
    ) -> Continuation {
        let (rd, rs1) = (rd_of(insn), rs1_of(insn));
        let imm = itype_imm(insn);
        self.begin_insn(mnem, pc, 4, insn);
        if rd != 0 {
            let a = self.xload(rs1);
            let b = self.tu().constant(imm as u32 as u64, 32);
            let res = self.tu_ref().icmp(pred, &a, &b);
            let res = self.tu().assignment(res, 32);
            self.xstore(rd, &res);
        }
        self.end_cont(*pc)
    }

    /// Shift immediate: `rd = op(rs1, shamt)`. The reserved-encoding
    /// check on `shamt` is kept from the original semantics even
    /// though well-formed RV32 encodings cannot reach it.
    pub(crate) fn gen_shift_imm(
        &mut self,
        mnem: &str,
        pc: &mut u32,
        insn: u32,
        size: u32,
        rd: u32,
        rs1: u32,
        shamt: u32,
        op: BinOp,
    ) -> Continuation {
        let cur_pc_val = self.begin_insn(mnem, pc, size, insn);
        if shamt > 31 {
            self.gen_raise_trap(&cur_pc_val, 0, 0);
            return self.end_term(Continuation::Branch);
        }
        if rd != 0 {
            let a = self.xload(rs1);
            let sh = self.tu().constant(shamt as u64, 32);
            let res = op(self.tu_ref(), &a, &sh);
            let res = self.tu().assignment(res, 32);
            self.xstore(rd, &res);
        }
        self.end_cont(*pc)
    }

    /// Memory load: `rd = extend(read-mem(MEM, rs1 + imm, bits))`.
    /// The read is emitted even for `rd == 0`; only the register
    /// write is suppressed.
    pub(crate) fn gen_load(
        &mut self,
        mnem: &str,
        pc: &mut u32,
        insn: u32,
        size: u32,
        rd: u32,
        rs1: u32,
        imm: i32,
        bits: u32,
        is_signed: bool,
    ) -> Continuation {
        self.begin_insn(mnem, pc, size, insn);
        let mem = self.space(AddrSpace::Mem);
        let base = self.xload(rs1);
        let off = self.tu().constant(imm as u32 as u64, 32);
        let sum = self.tu_ref().add(&base, &off);
        let addr = self.tu().assignment(sum, 32);
        let loaded = self.tu().read_mem(mem, &addr, bits);
        let val = self.tu_ref().ext(&loaded, 32, is_signed);
        self.xstore(rd, &val);
        self.end_cont(*pc)
    }

    /// Memory store: `write-mem(MEM, rs1 + imm, trunc(rs2, bits))`.
    pub(crate) fn gen_store(
        &mut self,
        mnem: &str,
        pc: &mut u32,
        insn: u32,
        size: u32,
        rs1: u32,
        rs2: u32,
        imm: i32,
        bits: u32,
    ) -> Continuation {
        self.begin_insn(mnem, pc, size, insn);
        let mem = self.space(AddrSpace::Mem);
        let base = self.xload(rs1);
        let off = self.tu().constant(imm as u32 as u64, 32);
        let sum = self.tu_ref().add(&base, &off);
        let addr = self.tu().assignment(sum, 32);
        let val = self.xload(rs2);
        self.tu().write_mem(mem, &addr, &val, bits);
        self.end_cont(*pc)
    }

    /// Direct jump with link: terminates the unit.
    pub(crate) fn gen_jal(
        &mut self,
        mnem: &str,
        pc: &mut u32,
        insn: u32,
        size: u32,
        rd: u32,
        imm: i32,
    ) -> Continuation {
        let cur = *pc;
        self.begin_insn(mnem, pc, size, insn);
        if rd != 0 {
            let link = self.tu().constant(*pc as u64, 32);
            self.xstore(rd, &link);
        }
        let target = cur.wrapping_add(imm as u32);
        self.set_next_pc_const(target);
        self.set_last_branch(if target == cur { 0 } else { 1 });
        self.end_term(Continuation::Branch)
    }

    /// Indirect jump with link: target `(rs1 + imm) & ~1`.
    pub(crate) fn gen_jalr(
        &mut self,
        mnem: &str,
        pc: &mut u32,
        insn: u32,
        size: u32,
        rd: u32,
        rs1: u32,
        imm: i32,
    ) -> Continuation {
        self.begin_insn(mnem, pc, size, insn);
        let a = self.xload(rs1);
        let off = self.tu().constant(imm as u32 as u64, 32);
        let sum = self.tu_ref().add(&a, &off);
        let mask = self.tu().constant(0xFFFF_FFFE, 32);
        let tgt = self.tu_ref().l_and(&sum, &mask);
        let tgt = self.tu().assignment(tgt, 32);
        if rd != 0 {
            let link = self.tu().constant(*pc as u64, 32);
            self.xstore(rd, &link);
        }
        self.set_next_pc(&tgt);
        self.set_last_branch(0xFFFF_FFFF);
        self.end_term(Continuation::Branch)
    }

    /// Conditional branch: NEXT_PC selects between target and
    /// fall-through; LAST_BRANCH is 0 only for a self-branch.
    pub(crate) fn gen_branch(
        &mut self,
        mnem: &str,
        pc: &mut u32,
        insn: u32,
        size: u32,
        rs1: u32,
        rs2: u32,
        imm: i32,
        pred: CmpPred,
    ) -> Continuation {
        let cur = *pc;
        self.begin_insn(mnem, pc, size, insn);
        let target = cur.wrapping_add(imm as u32);
        let a = self.xload(rs1);
        let b = self.xload(rs2);
        let cond = self.tu_ref().icmp(pred, &a, &b);
        let tv = self.tu().constant(target as u64, 32);
        let fv = self.tu().constant(*pc as u64, 32);
        let next = self.tu_ref().choose(&cond, &tv, &fv);
        self.set_next_pc(&next);
        self.set_last_branch(if target == cur { 0 } else { 1 });
        self.end_term(Continuation::Branch)
    }
}

// ── Expression node shorthands used as BinOp arguments ───────────

pub(crate) fn op_add(tu: &dyn TuBuilder, a: &Value, b: &Value) -> Value {
    tu.add(a, b)
}

pub(crate) fn op_sub(tu: &dyn TuBuilder, a: &Value, b: &Value) -> Value {
    tu.sub(a, b)
}

pub(crate) fn op_and(tu: &dyn TuBuilder, a: &Value, b: &Value) -> Value {
    tu.l_and(a, b)
}

pub(crate) fn op_or(tu: &dyn TuBuilder, a: &Value, b: &Value) -> Value {
    tu.l_or(a, b)
}

pub(crate) fn op_xor(tu: &dyn TuBuilder, a: &Value, b: &Value) -> Value {
    tu.l_xor(a, b)
}

pub(crate) fn op_shl(tu: &dyn TuBuilder, a: &Value, b: &Value) -> Value {
    tu.shl(a, b)
}

pub(crate) fn op_lshr(tu: &dyn TuBuilder, a: &Value, b: &Value) -> Value {
    tu.lshr(a, b)
}

pub(crate) fn op_ashr(tu: &dyn TuBuilder, a: &Value, b: &Value) -> Value {
    tu.ashr(a, b)
}

/// Register shifts take the amount modulo 32.
fn op_shl_masked(tu: &dyn TuBuilder, a: &Value, b: &Value) -> Value {
    let sh = tu.l_and(b, &tu.constant(31, 32));
    tu.shl(a, &sh)
}

fn op_lshr_masked(tu: &dyn TuBuilder, a: &Value, b: &Value) -> Value {
    let sh = tu.l_and(b, &tu.constant(31, 32));
    tu.lshr(a, &sh)
}

fn op_ashr_masked(tu: &dyn TuBuilder, a: &Value, b: &Value) -> Value {
    let sh = tu.l_and(b, &tu.constant(31, 32));
    tu.ashr(a, &sh)
}

// ── Upper immediate ──────────────────────────────────────────────

pub(crate) fn lui(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let rd = rd_of(insn);
    let imm = (insn & 0xFFFF_F000) as u64;
    vm.begin_insn("LUI", pc, 4, insn);
    if rd != 0 {
        let v = vm.tu().constant(imm, 32);
        vm.xstore(rd, &v);
    }
    vm.end_cont(*pc)
}

pub(crate) fn auipc(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let rd = rd_of(insn);
    let imm = insn & 0xFFFF_F000;
    let cur = *pc;
    vm.begin_insn("AUIPC", pc, 4, insn);
    if rd != 0 {
        let v = vm.tu().constant(cur.wrapping_add(imm) as u64, 32);
        vm.xstore(rd, &v);
    }
    vm.end_cont(*pc)
}

// ── Control flow ─────────────────────────────────────────────────

pub(crate) fn jal(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_jal("JAL", pc, insn, 4, rd_of(insn), jtype_imm(insn))
}

pub(crate) fn jalr(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_jalr("JALR", pc, insn, 4, rd_of(insn), rs1_of(insn), itype_imm(insn))
}

pub(crate) fn beq(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_branch("BEQ", pc, insn, 4, rs1_of(insn), rs2_of(insn), btype_imm(insn), CmpPred::Eq)
}

pub(crate) fn bne(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_branch("BNE", pc, insn, 4, rs1_of(insn), rs2_of(insn), btype_imm(insn), CmpPred::Ne)
}

pub(crate) fn blt(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_branch("BLT", pc, insn, 4, rs1_of(insn), rs2_of(insn), btype_imm(insn), CmpPred::Slt)
}

pub(crate) fn bge(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_branch("BGE", pc, insn, 4, rs1_of(insn), rs2_of(insn), btype_imm(insn), CmpPred::Sge)
}

pub(crate) fn bltu(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_branch("BLTU", pc, insn, 4, rs1_of(insn), rs2_of(insn), btype_imm(insn), CmpPred::Ult)
}

pub(crate) fn bgeu(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_branch("BGEU", pc, insn, 4, rs1_of(insn), rs2_of(insn), btype_imm(insn), CmpPred::Uge)
}

// ── Loads and stores ─────────────────────────────────────────────

pub(crate) fn lb(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_load("LB", pc, insn, 4, rd_of(insn), rs1_of(insn), itype_imm(insn), 8, true)
}

pub(crate) fn lh(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_load("LH", pc, insn, 4, rd_of(insn), rs1_of(insn), itype_imm(insn), 16, true)
}

pub(crate) fn lw(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_load("LW", pc, insn, 4, rd_of(insn), rs1_of(insn), itype_imm(insn), 32, true)
}

pub(crate) fn lbu(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_load("LBU", pc, insn, 4, rd_of(insn), rs1_of(insn), itype_imm(insn), 8, false)
}

pub(crate) fn lhu(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_load("LHU", pc, insn, 4, rd_of(insn), rs1_of(insn), itype_imm(insn), 16, false)
}

pub(crate) fn sb(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_store("SB", pc, insn, 4, rs1_of(insn), rs2_of(insn), stype_imm(insn), 8)
}

pub(crate) fn sh(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_store("SH", pc, insn, 4, rs1_of(insn), rs2_of(insn), stype_imm(insn), 16)
}

pub(crate) fn sw(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_store("SW", pc, insn, 4, rs1_of(insn), rs2_of(insn), stype_imm(insn), 32)
}

// ── ALU immediate ────────────────────────────────────────────────

pub(crate) fn addi(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_arith_imm("ADDI", pc, insn, 4, rd_of(insn), rs1_of(insn), itype_imm(insn), op_add)
}

pub(crate) fn slti(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_setcond_imm("SLTI", pc, insn, CmpPred::Slt)
}

pub(crate) fn sltiu(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_setcond_imm("SLTIU", pc, insn, CmpPred::Ult)
}

pub(crate) fn xori(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_arith_imm("XORI", pc, insn, 4, rd_of(insn), rs1_of(insn), itype_imm(insn), op_xor)
}

pub(crate) fn ori(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_arith_imm("ORI", pc, insn, 4, rd_of(insn), rs1_of(insn), itype_imm(insn), op_or)
}

pub(crate) fn andi(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_arith_imm("ANDI", pc, insn, 4, rd_of(insn), rs1_of(insn), itype_imm(insn), op_and)
}

pub(crate) fn slli(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let shamt = bit_sub::<20, 6>(insn);
    vm.gen_shift_imm("SLLI", pc, insn, 4, rd_of(insn), rs1_of(insn), shamt, op_shl)
}

pub(crate) fn srli(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let shamt = bit_sub::<20, 6>(insn);
    vm.gen_shift_imm("SRLI", pc, insn, 4, rd_of(insn), rs1_of(insn), shamt, op_lshr)
}

pub(crate) fn srai(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let shamt = bit_sub::<20, 6>(insn);
    vm.gen_shift_imm("SRAI", pc, insn, 4, rd_of(insn), rs1_of(insn), shamt, op_ashr)
}

// ── ALU register ─────────────────────────────────────────────────

pub(crate) fn add(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_arith_rr("ADD", pc, insn, 4, rd_of(insn), rs1_of(insn), rs2_of(insn), op_add)
}

pub(crate) fn sub(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_arith_rr("SUB", pc, insn, 4, rd_of(insn), rs1_of(insn), rs2_of(insn), op_sub)
}

pub(crate) fn sll(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_arith_rr("SLL", pc, insn, 4, rd_of(insn), rs1_of(insn), rs2_of(insn), op_shl_masked)
}

pub(crate) fn slt(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_setcond_rr("SLT", pc, insn, CmpPred::Slt)
}

pub(crate) fn sltu(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_setcond_rr("SLTU", pc, insn, CmpPred::Ult)
}

pub(crate) fn xor(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_arith_rr("XOR", pc, insn, 4, rd_of(insn), rs1_of(insn), rs2_of(insn), op_xor)
}

pub(crate) fn srl(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_arith_rr("SRL", pc, insn, 4, rd_of(insn), rs1_of(insn), rs2_of(insn), op_lshr_masked)
}

pub(crate) fn sra(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_arith_rr("SRA", pc, insn, 4, rd_of(insn), rs1_of(insn), rs2_of(insn), op_ashr_masked)
}

pub(crate) fn or(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_arith_rr("OR", pc, insn, 4, rd_of(insn), rs1_of(insn), rs2_of(insn), op_or)
}

pub(crate) fn and(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_arith_rr("AND", pc, insn, 4, rd_of(insn), rs1_of(insn), rs2_of(insn), op_and)
}

// ── Fences ───────────────────────────────────────────────────────

pub(crate) fn fence(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let pred = bit_sub::<24, 4>(insn);
    let succ = bit_sub::<20, 4>(insn);
    vm.begin_insn("FENCE", pc, 4, insn);
    let fence = vm.space(AddrSpace::Fence);
    let addr = vm.tu().constant(0, 32);
    let val = vm.tu().constant((pred << 4 | succ) as u64, 32);
    vm.tu().write_mem(fence, &addr, &val, 32);
    vm.end_cont(*pc)
}

/// FENCE.I ends the unit and obliges the caller to flush cached
/// translations.
pub(crate) fn fence_i(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let imm = bit_sub::<20, 12>(insn);
    vm.begin_insn("FENCE_I", pc, 4, insn);
    let fence = vm.space(AddrSpace::Fence);
    let addr = vm.tu().constant(1, 32);
    let val = vm.tu().constant(imm as u64, 32);
    vm.tu().write_mem(fence, &addr, &val, 32);
    vm.set_next_pc_const(*pc);
    vm.set_last_branch(0xFFFF_FFFF);
    vm.end_term(Continuation::Flush)
}

pub(crate) fn sfence_vma(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let (rs1, rs2) = (rs1_of(insn), rs2_of(insn));
    vm.begin_insn("SFENCE_VMA", pc, 4, insn);
    let fence = vm.space(AddrSpace::Fence);
    let a2 = vm.tu().constant(2, 32);
    let v1 = vm.xload(rs1);
    vm.tu().write_mem(fence, &a2, &v1, 32);
    let a3 = vm.tu().constant(3, 32);
    let v2 = vm.xload(rs2);
    vm.tu().write_mem(fence, &a3, &v2, 32);
    vm.end_cont(*pc)
}

// ── Environment and trap returns ─────────────────────────────────

pub(crate) fn ecall(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let cur_pc_val = vm.begin_insn("ECALL", pc, 4, insn);
    vm.gen_raise_trap(&cur_pc_val, 0, CAUSE_ECALL_FROM_M);
    vm.end_term(Continuation::Branch)
}

pub(crate) fn ebreak(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let cur_pc_val = vm.begin_insn("EBREAK", pc, 4, insn);
    vm.gen_raise_trap(&cur_pc_val, 0, CAUSE_BREAKPOINT);
    vm.end_term(Continuation::Branch)
}

pub(crate) fn uret(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.begin_insn("URET", pc, 4, insn);
    vm.gen_leave_trap(0);
    vm.end_term(Continuation::Branch)
}

pub(crate) fn sret(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.begin_insn("SRET", pc, 4, insn);
    vm.gen_leave_trap(1);
    vm.end_term(Continuation::Branch)
}

pub(crate) fn mret(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.begin_insn("MRET", pc, 4, insn);
    vm.gen_leave_trap(3);
    vm.end_term(Continuation::Branch)
}

pub(crate) fn wfi(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.begin_insn("WFI", pc, 4, insn);
    vm.gen_wait(1);
    vm.end_cont(*pc)
}

/// Table default for unclaimed slots.
pub fn illegal_instruction(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let size = if insn & 0x3 == 0x3 { 4 } else { 2 };
    let cur_pc_val = vm.begin_insn("ILLEGAL", pc, size, insn);
    vm.gen_illegal(&cur_pc_val);
    vm.end_term(Continuation::Branch)
}

// ── CSR access ───────────────────────────────────────────────────

fn csr_addr(vm: &mut Rv32gcVm, insn: u32) -> Value {
    let csr = bit_sub::<20, 12>(insn);
    vm.tu().constant(csr as u64, 32)
}

pub(crate) fn csrrw(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let (rd, rs1) = (rd_of(insn), rs1_of(insn));
    vm.begin_insn("CSRRW", pc, 4, insn);
    let csr = vm.space(AddrSpace::Csr);
    let addr = csr_addr(vm, insn);
    let src = vm.xload(rs1);
    let src = vm.tu().assignment(src, 32);
    if rd != 0 {
        let old = vm.tu().read_mem(csr, &addr, 32);
        vm.tu().write_mem(csr, &addr, &src, 32);
        vm.xstore(rd, &old);
    } else {
        // Write-only form: the CSR read (and its side effects) is
        // skipped.
        vm.tu().write_mem(csr, &addr, &src, 32);
    }
    vm.end_cont(*pc)
}

fn csr_read_modify(
    vm: &mut Rv32gcVm,
    mnem: &str,
    pc: &mut u32,
    insn: u32,
    clear: bool,
) -> Continuation {
    let (rd, rs1) = (rd_of(insn), rs1_of(insn));
    vm.begin_insn(mnem, pc, 4, insn);
    let csr = vm.space(AddrSpace::Csr);
    let addr = csr_addr(vm, insn);
    let src = vm.xload(rs1);
    let src = vm.tu().assignment(src, 32);
    let old = vm.tu().read_mem(csr, &addr, 32);
    if rs1 != 0 {
        let new = if clear {
            let inv = vm.tu_ref().l_not(&src);
            vm.tu_ref().l_and(&old, &inv)
        } else {
            vm.tu_ref().l_or(&old, &src)
        };
        vm.tu().write_mem(csr, &addr, &new, 32);
    }
    vm.xstore(rd, &old);
    vm.end_cont(*pc)
}

pub(crate) fn csrrs(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    csr_read_modify(vm, "CSRRS", pc, insn, false)
}

pub(crate) fn csrrc(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    csr_read_modify(vm, "CSRRC", pc, insn, true)
}

pub(crate) fn csrrwi(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let rd = rd_of(insn);
    let zimm = rs1_of(insn);
    vm.begin_insn("CSRRWI", pc, 4, insn);
    let csr = vm.space(AddrSpace::Csr);
    let addr = csr_addr(vm, insn);
    let src = vm.tu().constant(zimm as u64, 32);
    if rd != 0 {
        let old = vm.tu().read_mem(csr, &addr, 32);
        vm.tu().write_mem(csr, &addr, &src, 32);
        vm.xstore(rd, &old);
    } else {
        vm.tu().write_mem(csr, &addr, &src, 32);
    }
    vm.end_cont(*pc)
}

fn csr_imm_modify(
    vm: &mut Rv32gcVm,
    mnem: &str,
    pc: &mut u32,
    insn: u32,
    clear: bool,
) -> Continuation {
    let rd = rd_of(insn);
    let zimm = rs1_of(insn);
    vm.begin_insn(mnem, pc, 4, insn);
    let csr = vm.space(AddrSpace::Csr);
    let addr = csr_addr(vm, insn);
    let old = vm.tu().read_mem(csr, &addr, 32);
    if zimm != 0 {
        let src = vm.tu().constant(zimm as u64, 32);
        let new = if clear {
            let inv = vm.tu_ref().l_not(&src);
            vm.tu_ref().l_and(&old, &inv)
        } else {
            vm.tu_ref().l_or(&old, &src)
        };
        vm.tu().write_mem(csr, &addr, &new, 32);
    }
    vm.xstore(rd, &old);
    vm.end_cont(*pc)
}

pub(crate) fn csrrsi(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    csr_imm_modify(vm, "CSRRSI", pc, insn, false)
}

pub(crate) fn csrrci(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    csr_imm_modify(vm, "CSRRCI", pc, insn, true)
}
