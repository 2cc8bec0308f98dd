//! F/D-extension handlers.
//!
//! Arithmetic delegates to the host softfloat routines; the frontend
//! only arranges operands, rounding mode and result placement.
//! Single-precision values live NaN-boxed in the 64-bit F registers:
//! reads go through `unbox_s`, writes OR in the all-ones upper half.
//! After every softfloat call that can raise exceptions the sticky
//! flags are folded into the low five bits of FCSR.

use rv2c_core::{AddrSpace, TuBuilder, Value};

use super::base::{rd_of, rs1_of, rs2_of};
use super::Rv32gcVm;
use crate::bitutil::{bit_sub, sign_extend};
use crate::Continuation;

fn rm_of(insn: u32) -> u32 {
    bit_sub::<12, 3>(insn)
}

fn rs3_of(insn: u32) -> u32 {
    bit_sub::<27, 5>(insn)
}

fn itype_imm(insn: u32) -> i32 {
    sign_extend(bit_sub::<20, 12>(insn), 12)
}

fn stype_imm(insn: u32) -> i32 {
    sign_extend(bit_sub::<25, 7>(insn) << 5 | bit_sub::<7, 5>(insn), 12)
}

// Sign-manipulation selector.
#[derive(Clone, Copy, PartialEq)]
enum SgnjKind {
    Copy,
    Invert,
    Xor,
}

impl Rv32gcVm {
    /// Effective rounding mode: the static `rm` field when valid,
    /// otherwise the low FCSR byte (dynamic).
    fn rm_value(&mut self, rm: u32) -> Value {
        if rm < 7 {
            self.tu().constant(rm as u64, 32)
        } else {
            let fcsr = self.fcsr_load();
            let mask = self.tu().constant(0xFF, 32);
            self.tu_ref().l_and(&fcsr, &mask)
        }
    }

    /// Fold the softfloat sticky flags into FCSR[4:0].
    fn update_fflags(&mut self) {
        let flags = self.tu_ref().callf("fget_flags", &[], 32);
        let flags = self.tu().assignment(flags, 32);
        let fcsr = self.fcsr_load();
        let keep = self.tu().constant(0xFFFF_FFE0, 32);
        let kept = self.tu_ref().l_and(&fcsr, &keep);
        let low = self.tu().constant(0x1F, 32);
        let new_bits = self.tu_ref().l_and(&flags, &low);
        let merged = self.tu_ref().l_or(&kept, &new_bits);
        self.fcsr_store(&merged);
    }

    // ── Family helpers ───────────────────────────────────────────

    pub(crate) fn gen_fload(
        &mut self,
        mnem: &str,
        pc: &mut u32,
        insn: u32,
        size: u32,
        rd: u32,
        rs1: u32,
        imm: i32,
        bits: u32,
    ) -> Continuation {
        self.begin_insn(mnem, pc, size, insn);
        let mem = self.space(AddrSpace::Mem);
        let base = self.xload(rs1);
        let off = self.tu().constant(imm as u32 as u64, 32);
        let sum = self.tu_ref().add(&base, &off);
        let addr = self.tu().assignment(sum, 32);
        let loaded = self.tu().read_mem(mem, &addr, bits);
        if bits == 32 {
            self.fstore_boxed(rd, &loaded);
        } else {
            self.fstore64(rd, &loaded);
        }
        self.end_cont(*pc)
    }

    pub(crate) fn gen_fstore(
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
        let raw = self.fload(rs2);
        let val = if bits == 32 {
            self.tu_ref().trunc(&raw, 32)
        } else {
            raw
        };
        self.tu().write_mem(mem, &addr, &val, bits);
        self.end_cont(*pc)
    }

    /// Fused multiply-add family; `variant` selects
    /// FMADD/FMSUB/FNMADD/FNMSUB in the softfloat routine.
    fn gen_fma(
        &mut self,
        mnem: &str,
        pc: &mut u32,
        insn: u32,
        double: bool,
        variant: u32,
    ) -> Continuation {
        let (rd, rs1, rs2, rs3) = (rd_of(insn), rs1_of(insn), rs2_of(insn), rs3_of(insn));
        let rm = rm_of(insn);
        self.begin_insn(mnem, pc, 4, insn);
        let (a, b, c) = if double {
            (self.fload(rs1), self.fload(rs2), self.fload(rs3))
        } else {
            (self.unbox_s(rs1), self.unbox_s(rs2), self.unbox_s(rs3))
        };
        let sel = self.tu().constant(variant as u64, 32);
        let rm_v = self.rm_value(rm);
        let (name, bits) = if double { ("fmadd_d", 64) } else { ("fmadd_s", 32) };
        let res = self.tu_ref().callf(name, &[a, b, c, sel, rm_v], bits);
        let res = self.tu().assignment(res, bits);
        if double {
            self.fstore64(rd, &res);
        } else {
            self.fstore_boxed(rd, &res);
        }
        self.update_fflags();
        self.end_cont(*pc)
    }

    /// Two-operand softfloat arithmetic (`fadd_s`, `fdiv_d`, ...).
    fn gen_farith(
        &mut self,
        mnem: &str,
        pc: &mut u32,
        insn: u32,
        double: bool,
        name: &str,
    ) -> Continuation {
        let (rd, rs1, rs2) = (rd_of(insn), rs1_of(insn), rs2_of(insn));
        let rm = rm_of(insn);
        self.begin_insn(mnem, pc, 4, insn);
        let (a, b) = if double {
            (self.fload(rs1), self.fload(rs2))
        } else {
            (self.unbox_s(rs1), self.unbox_s(rs2))
        };
        let rm_v = self.rm_value(rm);
        let bits = if double { 64 } else { 32 };
        let res = self.tu_ref().callf(name, &[a, b, rm_v], bits);
        let res = self.tu().assignment(res, bits);
        if double {
            self.fstore64(rd, &res);
        } else {
            self.fstore_boxed(rd, &res);
        }
        self.update_fflags();
        self.end_cont(*pc)
    }

    fn gen_fsqrt(
        &mut self,
        mnem: &str,
        pc: &mut u32,
        insn: u32,
        double: bool,
    ) -> Continuation {
        let (rd, rs1) = (rd_of(insn), rs1_of(insn));
        let rm = rm_of(insn);
        self.begin_insn(mnem, pc, 4, insn);
        let a = if double { self.fload(rs1) } else { self.unbox_s(rs1) };
        let rm_v = self.rm_value(rm);
        let (name, bits) = if double { ("fsqrt_d", 64) } else { ("fsqrt_s", 32) };
        let res = self.tu_ref().callf(name, &[a, rm_v], bits);
        let res = self.tu().assignment(res, bits);
        if double {
            self.fstore64(rd, &res);
        } else {
            self.fstore_boxed(rd, &res);
        }
        self.update_fflags();
        self.end_cont(*pc)
    }

    /// Sign-bit mux: result takes rs1's magnitude and a sign derived
    /// from rs2.
    fn gen_fsgnj(
        &mut self,
        mnem: &str,
        pc: &mut u32,
        insn: u32,
        double: bool,
        kind: SgnjKind,
    ) -> Continuation {
        let (rd, rs1, rs2) = (rd_of(insn), rs1_of(insn), rs2_of(insn));
        self.begin_insn(mnem, pc, 4, insn);
        let (a, b, bits, mag, sgn) = if double {
            (
                self.fload(rs1),
                self.fload(rs2),
                64,
                0x7FFF_FFFF_FFFF_FFFFu64,
                0x8000_0000_0000_0000u64,
            )
        } else {
            (
                self.unbox_s(rs1),
                self.unbox_s(rs2),
                32,
                0x7FFF_FFFFu64,
                0x8000_0000u64,
            )
        };
        let mag_mask = self.tu().constant(mag, bits);
        let sgn_mask = self.tu().constant(sgn, bits);
        let magnitude = self.tu_ref().l_and(&a, &mag_mask);
        let sign_src = match kind {
            SgnjKind::Copy => b,
            SgnjKind::Invert => self.tu_ref().l_not(&b),
            SgnjKind::Xor => self.tu_ref().l_xor(&a, &b),
        };
        let sign = self.tu_ref().l_and(&sign_src, &sgn_mask);
        let res = self.tu_ref().l_or(&magnitude, &sign);
        let res = self.tu().assignment(res, bits);
        if double {
            self.fstore64(rd, &res);
        } else {
            self.fstore_boxed(rd, &res);
        }
        self.end_cont(*pc)
    }

    /// FMIN/FMAX via `fsel_*` (selector 0 = min, 1 = max).
    fn gen_fsel(
        &mut self,
        mnem: &str,
        pc: &mut u32,
        insn: u32,
        double: bool,
        selector: u32,
    ) -> Continuation {
        let (rd, rs1, rs2) = (rd_of(insn), rs1_of(insn), rs2_of(insn));
        self.begin_insn(mnem, pc, 4, insn);
        let (a, b) = if double {
            (self.fload(rs1), self.fload(rs2))
        } else {
            (self.unbox_s(rs1), self.unbox_s(rs2))
        };
        let sel = self.tu().constant(selector as u64, 32);
        let (name, bits) = if double { ("fsel_d", 64) } else { ("fsel_s", 32) };
        let res = self.tu_ref().callf(name, &[a, b, sel], bits);
        let res = self.tu().assignment(res, bits);
        if double {
            self.fstore64(rd, &res);
        } else {
            self.fstore_boxed(rd, &res);
        }
        self.update_fflags();
        self.end_cont(*pc)
    }

    /// FEQ/FLT/FLE via `fcmp_*` (selector 0 = eq, 1 = le, 2 = lt);
    /// the 0/1 result lands in the integer register file.
    fn gen_fcmp(
        &mut self,
        mnem: &str,
        pc: &mut u32,
        insn: u32,
        double: bool,
        selector: u32,
    ) -> Continuation {
        let (rd, rs1, rs2) = (rd_of(insn), rs1_of(insn), rs2_of(insn));
        self.begin_insn(mnem, pc, 4, insn);
        let (a, b) = if double {
            (self.fload(rs1), self.fload(rs2))
        } else {
            (self.unbox_s(rs1), self.unbox_s(rs2))
        };
        let sel = self.tu().constant(selector as u64, 32);
        let name = if double { "fcmp_d" } else { "fcmp_s" };
        let res = self.tu_ref().callf(name, &[a, b, sel], 32);
        let res = self.tu().assignment(res, 32);
        self.xstore(rd, &res);
        self.update_fflags();
        self.end_cont(*pc)
    }

    /// Float-to-int conversions: `fcvt_s` / `fcvt_64_32`, result into
    /// the integer register file.
    fn gen_fcvt_to_int(
        &mut self,
        mnem: &str,
        pc: &mut u32,
        insn: u32,
        double: bool,
        selector: u32,
    ) -> Continuation {
        let (rd, rs1) = (rd_of(insn), rs1_of(insn));
        let rm = rm_of(insn);
        self.begin_insn(mnem, pc, 4, insn);
        let a = if double { self.fload(rs1) } else { self.unbox_s(rs1) };
        let sel = self.tu().constant(selector as u64, 32);
        let rm_v = self.rm_value(rm);
        let name = if double { "fcvt_64_32" } else { "fcvt_s" };
        let res = self.tu_ref().callf(name, &[a, sel, rm_v], 32);
        let res = self.tu().assignment(res, 32);
        self.xstore(rd, &res);
        self.update_fflags();
        self.end_cont(*pc)
    }

    /// Int-to-float conversions: `fcvt_s` / `fcvt_32_64`, result into
    /// the F register file.
    fn gen_fcvt_from_int(
        &mut self,
        mnem: &str,
        pc: &mut u32,
        insn: u32,
        double: bool,
        selector: u32,
    ) -> Continuation {
        let (rd, rs1) = (rd_of(insn), rs1_of(insn));
        let rm = rm_of(insn);
        self.begin_insn(mnem, pc, 4, insn);
        let a = self.xload(rs1);
        let sel = self.tu().constant(selector as u64, 32);
        let rm_v = self.rm_value(rm);
        let (name, bits) = if double { ("fcvt_32_64", 64) } else { ("fcvt_s", 32) };
        let res = self.tu_ref().callf(name, &[a, sel, rm_v], bits);
        let res = self.tu().assignment(res, bits);
        if double {
            self.fstore64(rd, &res);
        } else {
            self.fstore_boxed(rd, &res);
        }
        self.update_fflags();
        self.end_cont(*pc)
    }
}

// ── Loads and stores ─────────────────────────────────────────────

pub(crate) fn flw(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fload("FLW", pc, insn, 4, rd_of(insn), rs1_of(insn), itype_imm(insn), 32)
}

pub(crate) fn fsw(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fstore("FSW", pc, insn, 4, rs1_of(insn), rs2_of(insn), stype_imm(insn), 32)
}

pub(crate) fn fld(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fload("FLD", pc, insn, 4, rd_of(insn), rs1_of(insn), itype_imm(insn), 64)
}

pub(crate) fn fsd(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fstore("FSD", pc, insn, 4, rs1_of(insn), rs2_of(insn), stype_imm(insn), 64)
}

// ── Fused multiply-add ───────────────────────────────────────────

pub(crate) fn fmadd_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fma("FMADD_S", pc, insn, false, 0)
}

pub(crate) fn fmsub_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fma("FMSUB_S", pc, insn, false, 1)
}

pub(crate) fn fnmadd_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fma("FNMADD_S", pc, insn, false, 2)
}

pub(crate) fn fnmsub_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fma("FNMSUB_S", pc, insn, false, 3)
}

pub(crate) fn fmadd_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fma("FMADD_D", pc, insn, true, 0)
}

pub(crate) fn fmsub_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fma("FMSUB_D", pc, insn, true, 1)
}

pub(crate) fn fnmadd_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fma("FNMADD_D", pc, insn, true, 2)
}

pub(crate) fn fnmsub_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fma("FNMSUB_D", pc, insn, true, 3)
}

// ── Arithmetic ───────────────────────────────────────────────────

pub(crate) fn fadd_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_farith("FADD_S", pc, insn, false, "fadd_s")
}

pub(crate) fn fsub_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_farith("FSUB_S", pc, insn, false, "fsub_s")
}

pub(crate) fn fmul_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_farith("FMUL_S", pc, insn, false, "fmul_s")
}

pub(crate) fn fdiv_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_farith("FDIV_S", pc, insn, false, "fdiv_s")
}

pub(crate) fn fsqrt_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fsqrt("FSQRT_S", pc, insn, false)
}

pub(crate) fn fadd_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_farith("FADD_D", pc, insn, true, "fadd_d")
}

pub(crate) fn fsub_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_farith("FSUB_D", pc, insn, true, "fsub_d")
}

pub(crate) fn fmul_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_farith("FMUL_D", pc, insn, true, "fmul_d")
}

pub(crate) fn fdiv_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_farith("FDIV_D", pc, insn, true, "fdiv_d")
}

pub(crate) fn fsqrt_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fsqrt("FSQRT_D", pc, insn, true)
}

// ── Sign manipulation ────────────────────────────────────────────

pub(crate) fn fsgnj_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fsgnj("FSGNJ_S", pc, insn, false, SgnjKind::Copy)
}

pub(crate) fn fsgnjn_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fsgnj("FSGNJN_S", pc, insn, false, SgnjKind::Invert)
}

pub(crate) fn fsgnjx_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fsgnj("FSGNJX_S", pc, insn, false, SgnjKind::Xor)
}

pub(crate) fn fsgnj_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fsgnj("FSGNJ_D", pc, insn, true, SgnjKind::Copy)
}

pub(crate) fn fsgnjn_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fsgnj("FSGNJN_D", pc, insn, true, SgnjKind::Invert)
}

pub(crate) fn fsgnjx_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fsgnj("FSGNJX_D", pc, insn, true, SgnjKind::Xor)
}

// ── Min/max ──────────────────────────────────────────────────────

pub(crate) fn fmin_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fsel("FMIN_S", pc, insn, false, 0)
}

pub(crate) fn fmax_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fsel("FMAX_S", pc, insn, false, 1)
}

pub(crate) fn fmin_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fsel("FMIN_D", pc, insn, true, 0)
}

pub(crate) fn fmax_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fsel("FMAX_D", pc, insn, true, 1)
}

// ── Comparison ───────────────────────────────────────────────────

pub(crate) fn feq_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fcmp("FEQ_S", pc, insn, false, 0)
}

pub(crate) fn flt_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fcmp("FLT_S", pc, insn, false, 2)
}

pub(crate) fn fle_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fcmp("FLE_S", pc, insn, false, 1)
}

pub(crate) fn feq_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fcmp("FEQ_D", pc, insn, true, 0)
}

pub(crate) fn flt_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fcmp("FLT_D", pc, insn, true, 2)
}

pub(crate) fn fle_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fcmp("FLE_D", pc, insn, true, 1)
}

// ── Classification ───────────────────────────────────────────────

pub(crate) fn fclass_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let (rd, rs1) = (rd_of(insn), rs1_of(insn));
    vm.begin_insn("FCLASS_S", pc, 4, insn);
    let a = vm.unbox_s(rs1);
    let res = vm.tu_ref().callf("fclass_s", &[a], 32);
    let res = vm.tu().assignment(res, 32);
    vm.xstore(rd, &res);
    vm.end_cont(*pc)
}

pub(crate) fn fclass_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let (rd, rs1) = (rd_of(insn), rs1_of(insn));
    vm.begin_insn("FCLASS_D", pc, 4, insn);
    let a = vm.fload(rs1);
    let res = vm.tu_ref().callf("fclass_d", &[a], 32);
    let res = vm.tu().assignment(res, 32);
    vm.xstore(rd, &res);
    vm.end_cont(*pc)
}

// ── Conversions ──────────────────────────────────────────────────

pub(crate) fn fcvt_w_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fcvt_to_int("FCVT_W_S", pc, insn, false, 0)
}

pub(crate) fn fcvt_wu_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fcvt_to_int("FCVT_WU_S", pc, insn, false, 1)
}

pub(crate) fn fcvt_s_w(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fcvt_from_int("FCVT_S_W", pc, insn, false, 2)
}

pub(crate) fn fcvt_s_wu(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fcvt_from_int("FCVT_S_WU", pc, insn, false, 3)
}

pub(crate) fn fcvt_w_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fcvt_to_int("FCVT_W_D", pc, insn, true, 0)
}

pub(crate) fn fcvt_wu_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fcvt_to_int("FCVT_WU_D", pc, insn, true, 1)
}

pub(crate) fn fcvt_d_w(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fcvt_from_int("FCVT_D_W", pc, insn, true, 2)
}

pub(crate) fn fcvt_d_wu(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    vm.gen_fcvt_from_int("FCVT_D_WU", pc, insn, true, 3)
}

/// Narrowing double-to-single conversion.
pub(crate) fn fcvt_s_d(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let (rd, rs1) = (rd_of(insn), rs1_of(insn));
    let rm = rm_of(insn);
    vm.begin_insn("FCVT_S_D", pc, 4, insn);
    let a = vm.fload(rs1);
    let rm_v = vm.rm_value(rm);
    let res = vm.tu_ref().callf("fconv_d2f", &[a, rm_v], 32);
    let res = vm.tu().assignment(res, 32);
    vm.fstore_boxed(rd, &res);
    vm.update_fflags();
    vm.end_cont(*pc)
}

/// Widening single-to-double conversion.
pub(crate) fn fcvt_d_s(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let (rd, rs1) = (rd_of(insn), rs1_of(insn));
    let rm = rm_of(insn);
    vm.begin_insn("FCVT_D_S", pc, 4, insn);
    let a = vm.unbox_s(rs1);
    let rm_v = vm.rm_value(rm);
    let res = vm.tu_ref().callf("fconv_f2d", &[a, rm_v], 64);
    let res = vm.tu().assignment(res, 64);
    vm.fstore64(rd, &res);
    vm.update_fflags();
    vm.end_cont(*pc)
}

// ── Raw bit moves ────────────────────────────────────────────────

pub(crate) fn fmv_x_w(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let (rd, rs1) = (rd_of(insn), rs1_of(insn));
    vm.begin_insn("FMV_X_W", pc, 4, insn);
    let raw = vm.fload(rs1);
    let low = vm.tu_ref().trunc(&raw, 32);
    let low = vm.tu().assignment(low, 32);
    vm.xstore(rd, &low);
    vm.end_cont(*pc)
}

pub(crate) fn fmv_w_x(vm: &mut Rv32gcVm, pc: &mut u32, insn: u32) -> Continuation {
    let (rd, rs1) = (rd_of(insn), rs1_of(insn));
    vm.begin_insn("FMV_W_X", pc, 4, insn);
    let v = vm.xload(rs1);
    let v = vm.tu().assignment(v, 32);
    vm.fstore_boxed(rd, &v);
    vm.end_cont(*pc)
}
