//! A-extension handlers: LR/SC and the AMO read-modify-write family.
//!
//! The aq/rl ordering bits are decoded away by the descriptor masks
//! and not differentiated: the MEM channel is the serialization
//! point. The reservation set is a separate channel keyed by address.

use rv2c_core::{AddrSpace, CmpPred, TuBuilder, Value};

use super::base::{op_add, op_and, op_or, op_xor, rd_of, rs1_of, rs2_of, BinOp};
use super::Rv32gcVm;
use crate::Continuation;

/// LR.W: load the word and mark a reservation for the address.
pub(crate) fn lr_w(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let (rd, rs1) = (rd_of(insn), rs1_of(insn));
    vm.begin_insn("LR_W", pc, 4, insn);
    let mem = vm.space(AddrSpace::Mem);
    let res = vm.space(AddrSpace::Res);
    let addr = vm.xload(rs1);
    let addr = vm.tu().assignment(addr, 32);
    let loaded = vm.tu().read_mem(mem, &addr, 32);
    let val = vm.tu_ref().ext(&loaded, 32, true);
    vm.xstore(rd, &val);
    let mark = vm.tu().constant(0xFFFF_FFFF, 32);
    vm.tu().write_mem(res, &addr, &mark, 32);
    vm.end_cont(*pc)
}

/// SC.W: store only if the reservation is still held; rd is 0 on
/// success.
pub(crate) fn sc_w(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let (rd, rs1, rs2) = (rd_of(insn), rs1_of(insn), rs2_of(insn));
    vm.begin_insn("SC_W", pc, 4, insn);
    let mem = vm.space(AddrSpace::Mem);
    let res = vm.space(AddrSpace::Res);
    let addr = vm.xload(rs1);
    let addr = vm.tu().assignment(addr, 32);
    let reservation = vm.tu().read_mem(res, &addr, 32);
    let val = vm.xload(rs2);
    let val = vm.tu().assignment(val, 32);
    vm.tu().append(&format!("if ({} != 0) {{", reservation.txt));
    vm.tu().write_mem(mem, &addr, &val, 32);
    vm.tu().append("}");
    if rd != 0 {
        let zero = vm.tu().constant(0, 32);
        let one = vm.tu().constant(1, 32);
        let failed = vm.tu_ref().icmp(CmpPred::Eq, &reservation, &zero);
        let flag = vm.tu_ref().choose(&failed, &one, &zero);
        let flag = vm.tu().assignment(flag, 32);
        vm.xstore(rd, &flag);
    }
    vm.end_cont(*pc)
}

/// Shared AMO shape: load old value into rd, store `op(old, rs2)`
/// back.
fn gen_amo(
    vm: &mut Rv32gcVm,
    mnem: &str,
    pc: &mut u32,
    insn: u32,
    op: BinOp,
) -> Continuation {
    let (rd, rs1, rs2) = (rd_of(insn), rs1_of(insn), rs2_of(insn));
    vm.begin_insn(mnem, pc, 4, insn);
    let mem = vm.space(AddrSpace::Mem);
    let addr = vm.xload(rs1);
    let addr = vm.tu().assignment(addr, 32);
    let old = vm.tu().read_mem(mem, &addr, 32);
    let src = vm.xload(rs2);
    let src = vm.tu().assignment(src, 32);
    vm.xstore(rd, &old);
    let new = op(vm.tu_ref(), &old, &src);
    let new = vm.tu().assignment(new, 32);
    vm.tu().write_mem(mem, &addr, &new, 32);
    vm.end_cont(*pc)
}

fn op_swap(_tu: &dyn TuBuilder, _a: &Value, b: &Value) -> Value {
    b.clone()
}

fn op_min_s(tu: &dyn TuBuilder, a: &Value, b: &Value) -> Value {
    let lt = tu.icmp(CmpPred::Slt, a, b);
    tu.choose(&lt, a, b)
}

fn op_max_s(tu: &dyn TuBuilder, a: &Value, b: &Value) -> Value {
    let gt = tu.icmp(CmpPred::Sgt, a, b);
    tu.choose(&gt, a, b)
}

fn op_min_u(tu: &dyn TuBuilder, a: &Value, b: &Value) -> Value {
    let lt = tu.icmp(CmpPred::Ult, a, b);
    tu.choose(&lt, a, b)
}

fn op_max_u(tu: &dyn TuBuilder, a: &Value, b: &Value) -> Value {
    let gt = tu.icmp(CmpPred::Ugt, a, b);
    tu.choose(&gt, a, b)
}

pub(crate) fn amoswap_w(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    gen_amo(vm, "AMOSWAP_W", pc, insn, op_swap)
}

pub(crate) fn amoadd_w(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    gen_amo(vm, "AMOADD_W", pc, insn, op_add)
}

pub(crate) fn amoxor_w(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    gen_amo(vm, "AMOXOR_W", pc, insn, op_xor)
}

pub(crate) fn amoand_w(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    gen_amo(vm, "AMOAND_W", pc, insn, op_and)
}

pub(crate) fn amoor_w(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    gen_amo(vm, "AMOOR_W", pc, insn, op_or)
}

pub(crate) fn amomin_w(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    gen_amo(vm, "AMOMIN_W", pc, insn, op_min_s)
}

pub(crate) fn amomax_w(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    gen_amo(vm, "AMOMAX_W", pc, insn, op_max_s)
}

pub(crate) fn amominu_w(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    gen_amo(vm, "AMOMINU_W", pc, insn, op_min_u)
}

pub(crate) fn amomaxu_w(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    gen_amo(vm, "AMOMAXU_W", pc, insn, op_max_u)
}
