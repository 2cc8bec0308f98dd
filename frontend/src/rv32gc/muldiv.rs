//! M-extension handlers: integer multiply and divide.
//!
//! The division edge cases (divide by zero, INT_MIN / -1) are encoded
//! as nested selects; C's ternary evaluates only the taken arm, so
//! the emitted code never executes a trapping host division.

use rv2c_core::TuBuilder;

use super::base::{rd_of, rs1_of, rs2_of};
use super::Rv32gcVm;
use crate::Continuation;

/// `rd = trunc(sel(ext(rs1) * ext(rs2)))` with per-opcode extension
/// signedness and high/low half selection.
fn gen_mul(
    vm: &mut Rv32gcVm,
    mnem: &str,
    pc: &mut u32,
    insn: u32,
    s1_signed: bool,
    s2_signed: bool,
    high: bool,
) -> Continuation {
    let (rd, rs1, rs2) = (rd_of(insn), rs1_of(insn), rs2_of(insn));
    vm.begin_insn(mnem, pc, 4, insn);
    if rd != 0 {
        let a = vm.xload(rs1);
        let b = vm.xload(rs2);
        let a64 = vm.tu_ref().ext(&a, 64, s1_signed);
        let b64 = vm.tu_ref().ext(&b, 64, s2_signed);
        let prod = vm.tu_ref().mul(&a64, &b64);
        let prod = vm.tu().assignment(prod, 64);
        let part = if high {
            let sh = vm.tu().constant(32, 32);
            vm.tu_ref().lshr(&prod, &sh)
        } else {
            prod
        };
        let res = vm.tu_ref().trunc(&part, 32);
        let res = vm.tu().assignment(res, 32);
        vm.xstore(rd, &res);
    }
    vm.end_cont(*pc)
}

pub(crate) fn mul(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    gen_mul(vm, "MUL", pc, insn, true, true, false)
}

pub(crate) fn mulh(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    gen_mul(vm, "MULH", pc, insn, true, true, true)
}

pub(crate) fn mulhsu(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    gen_mul(vm, "MULHSU", pc, insn, true, false, true)
}

pub(crate) fn mulhu(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    gen_mul(vm, "MULHU", pc, insn, false, false, true)
}

pub(crate) fn div(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    use rv2c_core::CmpPred::Eq;
    let (rd, rs1, rs2) = (rd_of(insn), rs1_of(insn), rs2_of(insn));
    vm.begin_insn("DIV", pc, 4, insn);
    if rd != 0 {
        let a = vm.xload(rs1);
        let a = vm.tu().assignment(a, 32);
        let b = vm.xload(rs2);
        let b = vm.tu().assignment(b, 32);
        let zero = vm.tu().constant(0, 32);
        let int_min = vm.tu().constant(0x8000_0000, 32);
        let neg_one = vm.tu().constant(0xFFFF_FFFF, 32);
        let by_zero = vm.tu_ref().icmp(Eq, &b, &zero);
        let ovf_a = vm.tu_ref().icmp(Eq, &a, &int_min);
        let ovf_b = vm.tu_ref().icmp(Eq, &b, &neg_one);
        let ovf = vm.tu_ref().l_and(&ovf_a, &ovf_b);
        let quot = vm.tu_ref().sdiv(&a, &b);
        let guarded = vm.tu_ref().choose(&ovf, &int_min, &quot);
        let res = vm.tu_ref().choose(&by_zero, &neg_one, &guarded);
        let res = vm.tu().assignment(res, 32);
        vm.xstore(rd, &res);
    }
    vm.end_cont(*pc)
}

pub(crate) fn divu(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    use rv2c_core::CmpPred::Eq;
    let (rd, rs1, rs2) = (rd_of(insn), rs1_of(insn), rs2_of(insn));
    vm.begin_insn("DIVU", pc, 4, insn);
    if rd != 0 {
        let a = vm.xload(rs1);
        let a = vm.tu().assignment(a, 32);
        let b = vm.xload(rs2);
        let b = vm.tu().assignment(b, 32);
        let zero = vm.tu().constant(0, 32);
        let all_ones = vm.tu().constant(0xFFFF_FFFF, 32);
        let by_zero = vm.tu_ref().icmp(Eq, &b, &zero);
        let quot = vm.tu_ref().udiv(&a, &b);
        let res = vm.tu_ref().choose(&by_zero, &all_ones, &quot);
        let res = vm.tu().assignment(res, 32);
        vm.xstore(rd, &res);
    }
    vm.end_cont(*pc)
}

pub(crate) fn rem(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    use rv2c_core::CmpPred::Eq;
    let (rd, rs1, rs2) = (rd_of(insn), rs1_of(insn), rs2_of(insn));
    vm.begin_insn("REM", pc, 4, insn);
    if rd != 0 {
        let a = vm.xload(rs1);
        let a = vm.tu().assignment(a, 32);
        let b = vm.xload(rs2);
        let b = vm.tu().assignment(b, 32);
        let zero = vm.tu().constant(0, 32);
        let int_min = vm.tu().constant(0x8000_0000, 32);
        let neg_one = vm.tu().constant(0xFFFF_FFFF, 32);
        let by_zero = vm.tu_ref().icmp(Eq, &b, &zero);
        let ovf_a = vm.tu_ref().icmp(Eq, &a, &int_min);
        let ovf_b = vm.tu_ref().icmp(Eq, &b, &neg_one);
        let ovf = vm.tu_ref().l_and(&ovf_a, &ovf_b);
        let rem = vm.tu_ref().srem(&a, &b);
        let guarded = vm.tu_ref().choose(&ovf, &zero, &rem);
        let res = vm.tu_ref().choose(&by_zero, &a, &guarded);
        let res = vm.tu().assignment(res, 32);
        vm.xstore(rd, &res);
    }
    vm.end_cont(*pc)
}

pub(crate) fn remu(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    use rv2c_core::CmpPred::Eq;
    let (rd, rs1, rs2) = (rd_of(insn), rs1_of(insn), rs2_of(insn));
    vm.begin_insn("REMU", pc, 4, insn);
    if rd != 0 {
        let a = vm.xload(rs1);
        let a = vm.tu().assignment(a, 32);
        let b = vm.xload(rs2);
        let b = vm.tu().assignment(b, 32);
        let zero = vm.tu().constant(0, 32);
        let by_zero = vm.tu_ref().icmp(Eq, &b, &zero);
        let rem = vm.tu_ref().urem(&a, &b);
        let res = vm.tu_ref().choose(&by_zero, &a, &rem);
        let res = vm.tu().assignment(res, 32);
        vm.xstore(rd, &res);
    }
    vm.end_cont(*pc)
}
