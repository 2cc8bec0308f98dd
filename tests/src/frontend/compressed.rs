//! Compressed instructions must emit the same semantic cores as
//! their base aliases, with a 2-byte PC advance.

use super::{halves, translate_one};

#[test]
fn c_addi4spn_adds_scaled_immediate_to_sp() {
    let src = translate_one(0, &halves(&[0x0044])); // c.addi4spn x9, sp, 4
    assert!(src.contains("C_ADDI4SPN_0x00000000:"));
    assert!(src.contains("(*x2 + 0x4U)"));
    assert!(src.contains("*x9 = tmp_0;"));
    assert!(src.contains("*next_pc = 0x2U;"));
}

#[test]
fn c_li_loads_signed_immediate() {
    let src = translate_one(0, &halves(&[0x52FD])); // c.li t0, -1
    assert!(src.contains("*x5 = 0xffffffffU;"));
}

#[test]
fn c_lui_rd_zero_is_illegal() {
    let src = translate_one(0, &halves(&[0x6005]));
    assert!(src.contains("*trap_state = 0x80020000U;"));
}

#[test]
fn c_lui_shifts_immediate() {
    let src = translate_one(0, &halves(&[0x6285])); // c.lui t0, 1
    assert!(src.contains("*x5 = 0x1000U;"));
}

#[test]
fn c_addi16sp_adjusts_stack_pointer() {
    let src = translate_one(0, &halves(&[0x6141])); // c.addi16sp sp, 16
    assert!(src.contains("(*x2 + 0x10U)"));
    assert!(src.contains("*x2 = tmp_0;"));
}

#[test]
fn c_sub_operates_on_primed_registers() {
    let src = translate_one(0, &halves(&[0x8C05])); // c.sub x8, x9
    assert!(src.contains("(*x8 - *x9)"));
    assert!(src.contains("*x8 = tmp_0;"));
}

#[test]
fn c_mv_copies_through_zero_source() {
    let src = translate_one(0, &halves(&[0x842A])); // c.mv x8, x10
    assert!(src.contains("(0x0U + *x10)"));
    assert!(src.contains("*x8 = tmp_0;"));
}

#[test]
fn c_beqz_compares_against_zero() {
    let src = translate_one(0, &halves(&[0xC401])); // c.beqz x8, +8
    assert!(src.contains("(*x8 == 0x0U)"));
    assert!(src.contains("? 0x8U : 0x2U"));
}

#[test]
fn c_j_is_a_direct_jump_without_link() {
    let src = translate_one(0, &halves(&[0xA011])); // c.j +4
    assert!(src.contains("*next_pc = 0x4U;"));
    assert!(src.contains("*last_br = 0x1U;"));
    assert!(!src.contains("*x1 = "));
}

#[test]
fn c_jalr_links_ra() {
    let src = translate_one(0x200, &halves(&[0x9082])); // c.jalr x1
    assert!(src.contains("*x1 = 0x202U;"));
    assert!(src.contains("*last_br = 0xffffffffU;"));
}

#[test]
fn c_slli_rs1_zero_is_illegal() {
    let src = translate_one(0, &halves(&[0x0006]));
    assert!(src.contains("*trap_state = 0x80020000U;"));
}

#[test]
fn c_ebreak_raises_breakpoint() {
    let src = translate_one(0x30, &halves(&[0x9002]));
    assert!(src.contains("*trap_state = 0x80030000U;"));
    assert!(src.contains("*pc = 0x30U;"));
}

#[test]
fn c_lwsp_loads_from_stack() {
    let src = translate_one(0, &halves(&[0x4292])); // c.lwsp t0, 4(sp)
    assert!(src.contains("(*x2 + 0x4U)"));
    assert!(src.contains("read_mem32(core_ptr, 0,"));
    assert!(src.contains("*x5 = "));
}

#[test]
fn c_swsp_stores_to_stack() {
    let src = translate_one(0, &halves(&[0xC216])); // c.swsp t0, 4(sp)
    assert!(src.contains("write_mem32(core_ptr, 0, tmp_0, *x5);"));
}

#[test]
fn c_fld_loads_doubleword_into_f_register() {
    let src = translate_one(0, &halves(&[0x2080])); // c.fld f8, 0(x9)
    assert!(src.contains("read_mem64(core_ptr, 0,"));
    assert!(src.contains("regs_ptr + 192")); // f8
    assert!(!src.contains("0xffffffff00000000"));
}

#[test]
fn c_flwsp_nan_boxes_the_loaded_word() {
    let src = translate_one(0, &halves(&[0x6092])); // c.flwsp f1, 4(sp)
    assert!(src.contains("read_mem32(core_ptr, 0,"));
    assert!(src.contains("| 0xffffffff00000000ULL)"));
}
