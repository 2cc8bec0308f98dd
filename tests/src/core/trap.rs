use rv2c_core::trap::*;

#[test]
fn trap_word_packing() {
    assert_eq!(trap_val(0, CAUSE_ILLEGAL_INSTRUCTION), 0x8002_0000);
    assert_eq!(trap_val(0, CAUSE_BREAKPOINT), 0x8003_0000);
    assert_eq!(trap_val(0, CAUSE_ECALL_FROM_M), 0x800B_0000);
    assert_eq!(trap_val(0x1234, 7), 0x8007_1234);
}

#[test]
fn pending_marker_is_high_byte() {
    assert_eq!(trap_val(0, 0) & 0xFF00_0000, TRAP_PENDING);
}
