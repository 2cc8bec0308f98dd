//! End-to-end emission checks: translate short guest programs and
//! assert on the architectural effects visible in the emitted source.

use rv2c_frontend::Continuation;

use super::{count, halves, translate_one, vm_with, words};

/// `c.jr ra` as a block terminator.
const RET: u16 = 0x8082;

#[test]
fn addi_writes_rd_and_next_pc() {
    let mut code = words(&[0x0070_0293]); // addi t0, zero, 7
    code.extend(halves(&[RET, 0]));
    let mut vm = vm_with(0, &code);
    let (src, n) = vm.translate_block(0).unwrap();
    assert_eq!(n, 2);
    assert!(src.contains("ADDI_0x00000000:"));
    assert!(src.contains("uint32_t *x5 = (uint32_t *)(regs_ptr + 20);"));
    assert!(src.contains("uint32_t tmp_0 = (0x0U + 0x7U);"));
    assert!(src.contains("*x5 = tmp_0;"));
    assert!(src.contains("*next_pc = 0x4U;"));
    assert_eq!(vm.last_continuation(), Continuation::Branch);
}

#[test]
fn lui_addi_pair_builds_constant() {
    // lui x6, 0x12345 ; addi x6, x6, 0x678
    let mut code = words(&[0x1234_5337, 0x6783_0313]);
    code.extend(halves(&[RET, 0]));
    let mut vm = vm_with(0, &code);
    let (src, n) = vm.translate_block(0).unwrap();
    assert_eq!(n, 3);
    assert!(src.contains("*x6 = 0x12345000U;"));
    assert!(src.contains("(*x6 + 0x678U)"));
    assert!(src.contains("*next_pc = 0x8U;"));
}

#[test]
fn beq_selects_target_and_marks_direct_branch() {
    let code = words(&[0x0000_0463]); // beq zero, zero, +8
    let mut vm = vm_with(0x1000, &code);
    let (src, n) = vm.translate_block(0x1000).unwrap();
    assert_eq!(n, 1);
    assert!(src.contains("*next_pc = ((0x0U == 0x0U) ? 0x1008U : 0x1004U);"));
    assert!(src.contains("*last_br = 0x1U;"));
    assert_eq!(vm.last_continuation(), Continuation::Branch);
}

#[test]
fn self_branch_marks_last_branch_zero() {
    let code = words(&[0x0000_0063]); // beq zero, zero, 0
    let mut vm = vm_with(0x1000, &code);
    let (src, _) = vm.translate_block(0x1000).unwrap();
    assert!(src.contains("*last_br = 0x0U;"));
}

#[test]
fn dii_raises_illegal_and_terminates() {
    let src = translate_one(0, &halves(&[0x0000]));
    assert!(src.contains("DII_0x00000000:"));
    assert!(src.contains("*trap_state = 0x80020000U;"));
    assert!(src.contains("*pc = 0x0U;"));
}

#[test]
fn mul_is_sixty_four_bit_signed_product() {
    let src = translate_one(0, &words(&[0x0220_81B3])); // mul x3, x1, x2
    assert!(src.contains("int64_t"));
    assert!(src.contains("(int32_t)(*x1)"));
    assert!(src.contains("*x3 = tmp_1;"));
}

#[test]
fn x0_is_never_stored() {
    // addi x0, x0, 7 ; lui x0, 0x12345 ; jal x0, +8 ; lw x0, 0(x1)
    let progs: &[u32] = &[0x0070_0013, 0x1234_5037, 0x0080_006F, 0x0000_A003];
    for &insn in progs {
        let src = translate_one(0, &words(&[insn]));
        assert!(!src.contains("*x0"), "x0 write leaked for {insn:#010x}");
    }
}

#[test]
fn load_with_rd_zero_still_reads_memory() {
    let src = translate_one(0, &words(&[0x0000_A003])); // lw x0, 0(x1)
    assert!(src.contains("read_mem32(core_ptr, 0,"));
}

#[test]
fn envelope_counts_match_instruction_count() {
    let mut code = words(&[0x0070_0293, 0x0073_0313]); // addi, addi
    code.extend(halves(&[RET, 0]));
    let mut vm = vm_with(0, &code);
    let (src, n) = vm.translate_block(0).unwrap();
    assert_eq!(n, 3);
    let n = n as usize;
    assert_eq!(count(&src, "/* sync pre"), n);
    assert_eq!(count(&src, "/* sync post"), n);
    assert_eq!(count(&src, "if (*trap_state != 0) goto trap_entry;"), n);
    // Exactly one NEXT_PC write per instruction, none in the epilogue.
    assert_eq!(count(&src, "*next_pc = "), n);
}

#[test]
fn trap_epilogue_shape() {
    let src = translate_one(0, &words(&[0x0070_0293]));
    let tail: Vec<&str> = src.lines().rev().take(6).collect();
    assert_eq!(tail[0], "}");
    assert_eq!(tail[1].trim(), "return *next_pc;");
    assert_eq!(tail[2].trim(), "*last_br = 0xffffffffU;");
    assert_eq!(tail[3].trim(), "enter_trap(core_ptr, *trap_state, *pc);");
    assert_eq!(tail[4], "trap_entry:");
    assert_eq!(tail[5].trim(), "return *next_pc;");
}

#[test]
fn disassembly_strips_to_identical_source() {
    let code = words(&[0x0070_0293, 0x0000_0463]);
    let base = 0x1000;
    let mut plain = vm_with(base, &code);
    let (without, _) = plain.translate_block(base).unwrap();

    let mut verbose = vm_with(base, &code);
    verbose.set_disass(true);
    let (with, _) = verbose.translate_block(base).unwrap();

    assert_ne!(without, with);
    assert!(with.contains("print_disass(core_ptr, 0x1000U, \"li t0, 7\");"));
    let stripped: String = with
        .lines()
        .filter(|l| !l.contains("print_disass("))
        .map(|l| format!("{l}\n"))
        .collect();
    assert_eq!(stripped, without);
}

#[test]
fn jalr_links_and_marks_indirect() {
    let src = translate_one(0x100, &words(&[0x0001_00E7])); // jalr ra, x2, 0
    assert!(src.contains("& 0xfffffffeU)"));
    assert!(src.contains("*x1 = 0x104U;"));
    assert!(src.contains("*last_br = 0xffffffffU;"));
}

#[test]
fn fence_i_flushes() {
    let code = words(&[0x0000_100F]);
    let mut vm = vm_with(0, &code);
    let (src, _) = vm.translate_block(0).unwrap();
    assert_eq!(vm.last_continuation(), Continuation::Flush);
    assert!(src.contains("write_mem32(core_ptr, 2, 0x1U, 0x0U);"));
    assert!(src.contains("*last_br = 0xffffffffU;"));
    assert!(src.contains("*next_pc = 0x4U;"));
}

#[test]
fn fence_packs_pred_succ() {
    // fence rw, w  (pred = 0b0011, succ = 0b0001)
    let src = translate_one(0, &words(&[0x0310_000F]));
    assert!(src.contains("write_mem32(core_ptr, 2, 0x0U, 0x31U);"));
}

#[test]
fn mret_reads_epc_and_goes_indirect() {
    let code = words(&[0x3020_0073]);
    let mut vm = vm_with(0, &code);
    let (src, _) = vm.translate_block(0).unwrap();
    assert!(src.contains("leave_trap(core_ptr, 3);"));
    assert!(src.contains("read_mem32(core_ptr, 1, 0x341U);"));
    assert!(src.contains("*last_br = 0xffffffffU;"));
    assert_eq!(vm.last_continuation(), Continuation::Branch);
}

#[test]
fn ecall_raises_cause_eleven() {
    let src = translate_one(0x40, &words(&[0x0000_0073]));
    assert!(src.contains("*trap_state = 0x800b0000U;"));
    assert!(src.contains("*pc = 0x40U;"));
}

#[test]
fn csrrw_rd_zero_skips_the_read() {
    // csrrw zero, mtvec, x1
    let src = translate_one(0, &words(&[0x3050_9073]));
    assert!(!src.contains("read_mem32(core_ptr, 1,"));
    assert!(src.contains("write_mem32(core_ptr, 1, 0x305U,"));
}

#[test]
fn csrrs_rs1_zero_is_read_only() {
    // csrrs x5, mtvec, zero
    let src = translate_one(0, &words(&[0x3050_22F3]));
    assert!(src.contains("read_mem32(core_ptr, 1, 0x305U);"));
    assert!(!src.contains("write_mem32(core_ptr, 1,"));
    assert!(src.contains("*x5 = "));
}

#[test]
fn lr_marks_reservation() {
    // lr.w t0, (x1)
    let src = translate_one(0, &words(&[0x1000_A2AF]));
    assert!(src.contains("read_mem32(core_ptr, 0, tmp_0);"));
    assert!(src.contains("write_mem32(core_ptr, 3, tmp_0, 0xffffffffU);"));
}

#[test]
fn sc_stores_conditionally_and_reports_success_as_zero() {
    // sc.w t0, x2, (x1)
    let src = translate_one(0, &words(&[0x1820_A2AF]));
    assert!(src.contains("read_mem32(core_ptr, 3, tmp_0);"));
    assert!(src.contains("if (tmp_1 != 0) {"));
    assert!(src.contains("write_mem32(core_ptr, 0, tmp_0, tmp_2);"));
    assert!(src.contains("((tmp_1 == 0x0U) ? 0x1U : 0x0U)"));
}

#[test]
fn amoadd_loads_combines_stores() {
    // amoadd.w t0, x2, (x1)
    let src = translate_one(0, &words(&[0x0020_A2AF]));
    assert!(src.contains("read_mem32(core_ptr, 0, tmp_0);"));
    assert!(src.contains("*x5 = tmp_1;"));
    assert!(src.contains("(tmp_1 + tmp_2)"));
    assert!(src.contains("write_mem32(core_ptr, 0, tmp_0, tmp_3);"));
}

#[test]
fn div_guards_zero_and_overflow() {
    let src = translate_one(0, &words(&[0x0220_C1B3])); // div x3, x1, x2
    assert!(src.contains("== 0x80000000U)"));
    assert!(src.contains("== 0xffffffffU)"));
    assert!(src.contains("? 0xffffffffU :"));
    assert!(src.contains("/ "));
}

#[test]
fn rem_by_zero_returns_dividend() {
    let src = translate_one(0, &words(&[0x0220_E1B3])); // rem x3, x1, x2
    assert!(src.contains("? tmp_0 :"));
    assert!(src.contains("% "));
}

#[test]
fn shift_reserved_shamt_is_preserved_check_only() {
    // A well-formed RV32 slli never trips the check; the emitted
    // source must carry the plain shift.
    let src = translate_one(0, &words(&[0x0030_9293])); // slli t0, x1, 3
    assert!(src.contains("(*x1 << 0x3U)"));
    assert!(!src.contains("*trap_state = "));
}

#[test]
fn max_insns_caps_the_unit() {
    let code = words(&[0x0070_0293, 0x0070_0293, 0x0070_0293, 0x0070_0293]);
    let mut vm = vm_with(0, &code);
    vm.set_max_insns(2);
    let (_, n) = vm.translate_block(0).unwrap();
    assert_eq!(n, 2);
    assert_eq!(vm.last_continuation(), Continuation::Cont);
}
