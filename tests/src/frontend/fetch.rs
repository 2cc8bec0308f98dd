use rv2c_core::TranslationError;

use super::{halves, vm_with, words};

#[test]
fn access_fault_carries_the_pc() {
    let mut vm = vm_with(0, &words(&[0x0070_0293]));
    let err = vm.translate_block(0x100).unwrap_err();
    assert_eq!(err, TranslationError::AccessFault { pc: 0x100 });
}

#[test]
fn v2p_failure_mid_block_faults_at_that_pc() {
    // One mapped instruction, then the stream runs off the mapping.
    let mut vm = vm_with(0, &words(&[0x0070_0293]));
    let err = vm.translate_block(0).unwrap_err();
    assert_eq!(err, TranslationError::AccessFault { pc: 4 });
}

#[test]
fn jal_self_loop_stops_simulation() {
    let mut vm = vm_with(0x2000, &words(&[0x0000_006F]));
    let err = vm.translate_block(0x2000).unwrap_err();
    assert_eq!(err, TranslationError::SimulationStopped { code: 0 });
}

#[test]
fn compressed_self_loop_stops_simulation() {
    let mut vm = vm_with(0, &halves(&[0xA001, 0x0000]));
    let err = vm.translate_block(0).unwrap_err();
    assert_eq!(err, TranslationError::SimulationStopped { code: 0 });
}

#[test]
fn page_cross_compressed_skips_second_half_read() {
    // One mapped page; a compressed terminator sits in its last two
    // bytes. Reading past the page would fault, so success proves the
    // second half-read was skipped.
    let mut mem = vec![0u8; 0x1000];
    mem[0xFFE..].copy_from_slice(&0x8082u16.to_le_bytes()); // c.jr ra
    let mut vm = vm_with(0, &mem);
    let (src, n) = vm.translate_block(0xFFE).expect("page-cross fetch failed");
    assert_eq!(n, 1);
    assert!(src.contains("C_JR_0x00000ffe:"));
}

#[test]
fn page_cross_full_insn_reads_both_halves() {
    let mut mem = vec![0u8; 0x1008];
    // addi t0, zero, 7 spanning the page boundary.
    mem[0xFFE..0x1002].copy_from_slice(&0x0070_0293u32.to_le_bytes());
    mem[0x1002..0x1004].copy_from_slice(&0x8082u16.to_le_bytes());
    let mut vm = vm_with(0, &mem);
    let (src, n) = vm.translate_block(0xFFE).unwrap();
    assert_eq!(n, 2);
    assert!(src.contains("ADDI_0x00000ffe:"));
    assert!(src.contains("C_JR_0x00001002:"));
}
