use rv2c_core::{CBlockBuilder, CmpPred, GuestCore, RegModel, TuBuilder};

use crate::mock::TestCore;

fn builder() -> CBlockBuilder {
    let core = TestCore::with_code(0, &[]);
    CBlockBuilder::new(RegModel::from_core(&core))
}

#[test]
fn prologue_declares_control_pointers() {
    let mut tu = builder();
    tu.open_block("block_test");
    let src = tu.finish();
    assert!(src.starts_with(
        "uint32_t block_test(uint8_t *core_ptr, uint8_t *regs_ptr) {\n"
    ));
    assert!(src.contains("uint32_t *pc = (uint32_t *)(regs_ptr + 384);"));
    assert!(src.contains("uint32_t *next_pc = (uint32_t *)(regs_ptr + 388);"));
    assert!(src.contains("uint32_t *trap_state = (uint32_t *)(regs_ptr + 400);"));
    assert!(src.contains("uint32_t *last_br = (uint32_t *)(regs_ptr + 392);"));
    assert!(src.contains("uint32_t *fcsr = (uint32_t *)(regs_ptr + 396);"));
    assert!(src.trim_end().ends_with('}'));
}

#[test]
fn x_register_pointers_hoisted_on_first_use() {
    let mut tu = builder();
    tu.open_block("block_test");
    let v = tu.load(5, 0);
    assert_eq!(v.txt, "*x5");
    assert_eq!(v.bits, 32);
    assert!(tu.defined_regs()[5]);
    assert!(!tu.defined_regs()[6]);

    // A second use must not duplicate the declaration.
    let c = tu.constant(7, 32);
    tu.store(&c, 5);
    let src = tu.finish();
    assert_eq!(
        src.matches("uint32_t *x5 = (uint32_t *)(regs_ptr + 20);").count(),
        1
    );
    assert!(src.contains("*x5 = 0x7U;"));
}

#[test]
fn f_registers_are_inline_derefs() {
    let mut tu = builder();
    tu.open_block("block_test");
    let v = tu.load(33, 0); // f1
    assert_eq!(v.txt, "(*((uint64_t *)(regs_ptr + 136)))");
    assert_eq!(v.bits, 64);
    // F accesses never touch the X cache.
    assert!(tu.defined_regs().iter().all(|d| !d));
}

#[test]
fn assignment_names_are_fresh_and_reset() {
    let mut tu = builder();
    tu.open_block("block_test");
    let a = tu.constant(1, 32);
    let t0 = tu.assignment(a, 32);
    let b = tu.constant(2, 32);
    let t1 = tu.assignment(b, 32);
    assert_eq!(t0.txt, "tmp_0");
    assert_eq!(t1.txt, "tmp_1");
    let _ = tu.finish();

    tu.open_block("block_next");
    let c = tu.constant(3, 32);
    let t = tu.assignment(c, 32);
    assert_eq!(t.txt, "tmp_0");
}

#[test]
fn read_write_mem_emission() {
    let mut tu = builder();
    tu.open_block("block_test");
    let addr = tu.constant(0x10, 32);
    let v = tu.read_mem(0, &addr, 16);
    assert_eq!(v.bits, 16);
    let val = tu.constant(0xBEEF, 32);
    tu.write_mem(0, &addr, &val, 16);
    let src = tu.finish();
    assert!(src.contains("uint16_t tmp_0 = read_mem16(core_ptr, 0, 0x10U);"));
    assert!(src.contains("write_mem16(core_ptr, 0, 0x10U, ((uint16_t)(0xbeefU)));"));
}

#[test]
fn ext_and_trunc_cast_chains() {
    let tu = builder();
    let v = tu.constant(0xFF, 8);
    assert_eq!(tu.ext(&v, 32, true).txt, "((int32_t)(int8_t)(0xffU))");
    assert_eq!(tu.ext(&v, 32, false).txt, "((uint32_t)(uint8_t)(0xffU))");
    let w = tu.constant(0x1_0000, 32);
    assert_eq!(tu.trunc(&w, 16).txt, "((uint16_t)(0x10000U))");
}

#[test]
fn icmp_signedness() {
    let tu = builder();
    let a = tu.constant(1, 32);
    let b = tu.constant(2, 32);
    let s = tu.icmp(CmpPred::Slt, &a, &b);
    assert!(s.txt.contains("int32_t"));
    let u = tu.icmp(CmpPred::Ult, &a, &b);
    assert!(!u.txt.contains("int32_t"));
    assert!(u.txt.contains('<'));
}

#[test]
fn scopes_bracket_and_indent() {
    let mut tu = builder();
    tu.open_block("block_test");
    tu.open_scope();
    tu.append("stmt();");
    tu.close_scope();
    let src = tu.finish();
    assert!(src.contains("    {\n        stmt();\n    }\n"));
}

#[test]
fn sixty_four_bit_constants_get_ull_suffix() {
    let tu = builder();
    assert_eq!(tu.constant(0xFFFF_FFFF_0000_0000, 64).txt, "0xffffffff00000000ULL");
    assert_eq!(tu.constant(5, 32).txt, "0x5U");
}

#[test]
fn reg_model_snapshots_layout() {
    let core = TestCore::with_code(0, &[]);
    let model = RegModel::from_core(&core);
    assert_eq!(model.num_regs(), crate::mock::NUM_REGS);
    assert_eq!(model.info(0).offset, 0);
    assert_eq!(model.info(5).offset, 20);
    assert_eq!(model.info(32).offset, 128); // f0 after 32 words
    assert_eq!(model.info(32).bits, 64);
    assert_eq!(model.info(core.idx_pc()).offset, 384);
    assert_eq!(model.control_name(core.idx_next_pc()), Some("next_pc"));
    assert_eq!(model.control_name(3), None);
}
