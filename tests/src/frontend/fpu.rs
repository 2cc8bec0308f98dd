//! F/D emission checks: softfloat delegation, NaN-boxing, rounding
//! mode selection and FCSR flag writeback.

use super::{count, translate_one, words};

#[test]
fn flw_nan_boxes_into_f_register() {
    let src = translate_one(0, &words(&[0x0000_A087])); // flw f1, 0(x1)
    assert!(src.contains("read_mem32(core_ptr, 0,"));
    assert!(src.contains("| 0xffffffff00000000ULL)"));
    assert!(src.contains("regs_ptr + 136")); // f1
}

#[test]
fn fld_stores_raw_doubleword() {
    let src = translate_one(0, &words(&[0x0000_B087])); // fld f1, 0(x1)
    assert!(src.contains("read_mem64(core_ptr, 0,"));
    assert!(!src.contains("0xffffffff00000000"));
}

#[test]
fn fsw_truncates_the_register() {
    let src = translate_one(0, &words(&[0x0020_A027])); // fsw f2, 0(x1)
    assert!(src.contains("write_mem32(core_ptr, 0,"));
    assert!(src.contains("regs_ptr + 144")); // f2
}

#[test]
fn fadd_s_unboxes_and_updates_flags() {
    let src = translate_one(0, &words(&[0x0031_00D3])); // fadd.s f1, f2, f3
    assert_eq!(count(&src, "unbox_s("), 2);
    assert!(src.contains("fadd_s(tmp_0, tmp_1, 0x0U)"));
    assert!(src.contains("| 0xffffffff00000000ULL)"));
    assert!(src.contains("fget_flags()"));
    assert!(src.contains("*fcsr = ((*fcsr & 0xffffffe0U) | (tmp_3 & 0x1fU));"));
}

#[test]
fn dynamic_rounding_mode_reads_fcsr() {
    let src = translate_one(0, &words(&[0x0031_70D3])); // fadd.s, rm=DYN
    assert!(src.contains("(*fcsr & 0xffU)"));
}

#[test]
fn flt_s_emits_exactly_one_compare() {
    let src = translate_one(0, &words(&[0xA020_92D3])); // flt.s t0, f1, f2
    assert_eq!(count(&src, "fcmp_s("), 1);
    assert!(src.contains(", 0x2U)"));
    assert!(src.contains("*x5 = tmp_2;"));
}

#[test]
fn feq_and_fle_selectors() {
    let feq = translate_one(0, &words(&[0xA020_A2D3])); // feq.s
    assert!(feq.contains("fcmp_s(tmp_0, tmp_1, 0x0U)"));
    let fle = translate_one(0, &words(&[0xA020_82D3])); // fle.s
    assert!(fle.contains("fcmp_s(tmp_0, tmp_1, 0x1U)"));
}

#[test]
fn fmv_x_w_is_a_raw_truncate() {
    let src = translate_one(0, &words(&[0xE000_82D3])); // fmv.x.w t0, f1
    assert!(!src.contains("unbox_s("));
    assert!(src.contains("((uint32_t)((*((uint64_t *)(regs_ptr + 136)))))"));
    assert!(src.contains("*x5 = tmp_0;"));
}

#[test]
fn fmv_w_x_boxes_the_integer() {
    let src = translate_one(0, &words(&[0xF002_80D3])); // fmv.w.x f1, t0
    assert!(src.contains("| 0xffffffff00000000ULL)"));
}

#[test]
fn fsgnjx_s_muxes_the_sign_bit() {
    let src = translate_one(0, &words(&[0x2031_20D3])); // fsgnjx.s f1, f2, f3
    assert!(src.contains("& 0x7fffffffU"));
    assert!(src.contains("& 0x80000000U"));
    assert!(src.contains("^"));
    assert!(src.contains("| 0xffffffff00000000ULL)"));
}

#[test]
fn fsgnj_d_uses_wide_masks() {
    let src = translate_one(0, &words(&[0x2231_00D3])); // fsgnj.d f1, f2, f3
    assert!(src.contains("& 0x7fffffffffffffffULL"));
    assert!(src.contains("& 0x8000000000000000ULL"));
}

#[test]
fn fmin_fmax_selectors() {
    let fmin = translate_one(0, &words(&[0x2831_00D3])); // fmin.s
    assert!(fmin.contains("fsel_s(tmp_0, tmp_1, 0x0U)"));
    let fmax = translate_one(0, &words(&[0x2831_10D3])); // fmax.s
    assert!(fmax.contains("fsel_s(tmp_0, tmp_1, 0x1U)"));
}

#[test]
fn fclass_writes_integer_rd_without_flags() {
    let src = translate_one(0, &words(&[0xE000_92D3])); // fclass.s t0, f1
    assert!(src.contains("fclass_s(tmp_0)"));
    assert!(src.contains("*x5 = tmp_1;"));
    assert!(!src.contains("fget_flags"));
}

#[test]
fn fcvt_w_s_converts_to_integer() {
    let src = translate_one(0, &words(&[0xC000_82D3])); // fcvt.w.s t0, f1
    assert!(src.contains("fcvt_s(tmp_0, 0x0U, 0x0U)"));
    assert!(src.contains("*x5 = tmp_1;"));
    assert!(src.contains("fget_flags()"));
}

#[test]
fn fcvt_s_w_converts_from_integer_and_boxes() {
    let src = translate_one(0, &words(&[0xD000_80D3])); // fcvt.s.w f1, x1
    assert!(src.contains("fcvt_s(*x1, 0x2U, 0x0U)"));
    assert!(src.contains("| 0xffffffff00000000ULL)"));
}

#[test]
fn fcvt_between_precisions() {
    let widen = translate_one(0, &words(&[0x4201_00D3])); // fcvt.d.s f1, f2
    assert!(widen.contains("fconv_f2d("));
    assert!(!widen.contains("| 0xffffffff00000000ULL)"));
    let narrow = translate_one(0, &words(&[0x4011_00D3])); // fcvt.s.d f1, f2
    assert!(narrow.contains("fconv_d2f("));
    assert!(narrow.contains("| 0xffffffff00000000ULL)"));
}

#[test]
fn fcvt_d_conversions_use_width_helpers() {
    let to_int = translate_one(0, &words(&[0xC200_82D3])); // fcvt.w.d t0, f1
    assert!(to_int.contains("fcvt_64_32("));
    let from_int = translate_one(0, &words(&[0xD200_80D3])); // fcvt.d.w f1, x1
    assert!(from_int.contains("fcvt_32_64("));
}

#[test]
fn fmadd_variants_select_the_operation() {
    let fmadd = translate_one(0, &words(&[0x2031_00C3])); // fmadd.s f1, f2, f3, f4
    assert!(fmadd.contains("fmadd_s(tmp_0, tmp_1, tmp_2, 0x0U, 0x0U)"));
    let fnmadd = translate_one(0, &words(&[0x2031_00CF])); // fnmadd.s
    assert!(fnmadd.contains("fmadd_s(tmp_0, tmp_1, tmp_2, 0x2U, 0x0U)"));
    let fmadd_d = translate_one(0, &words(&[0x2231_00C3])); // fmadd.d
    assert!(fmadd_d.contains("fmadd_d("));
}

#[test]
fn fsqrt_s_single_operand() {
    let src = translate_one(0, &words(&[0x5801_00D3])); // fsqrt.s f1, f2
    assert!(src.contains("fsqrt_s(tmp_0, 0x0U)"));
}
