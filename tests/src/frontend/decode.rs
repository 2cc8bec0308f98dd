use proptest::prelude::*;
use rv2c_frontend::rv32gc::decode::{
    descriptors, extract_fields, DecodeTables, EXTR_MASK16, EXTR_MASK32,
};
use rv2c_frontend::{IsaConfig, MisaExt};

fn lookup(w: u32) -> Option<usize> {
    DecodeTables::get(&IsaConfig::RV32GC)
        .lookup(w)
        .map(|h| h as usize)
}

fn handler_of(mnem: &str) -> usize {
    descriptors()
        .iter()
        .find(|d| d.mnemonic == mnem)
        .unwrap_or_else(|| panic!("no descriptor {mnem}"))
        .handler as usize
}

#[test]
fn descriptor_list_is_complete() {
    assert_eq!(descriptors().len(), 159);
}

#[test]
fn extraction_masks() {
    assert_eq!(EXTR_MASK16, 0x3FFF);
    assert_eq!(EXTR_MASK32, 0x3FFC_1C1F);
    // Bit 20 of the word is part of the quadrant-3 fingerprint:
    // ECALL and EBREAK must land in different slots.
    assert_ne!(extract_fields(0x0000_0073), extract_fields(0x0010_0073));
}

#[test]
fn basic_routing() {
    assert_eq!(lookup(0x0070_0293), Some(handler_of("addi")));
    assert_eq!(lookup(0x1234_5337), Some(handler_of("lui")));
    assert_eq!(lookup(0x0000_0073), Some(handler_of("ecall")));
    assert_eq!(lookup(0x0010_0073), Some(handler_of("ebreak")));
    assert_eq!(lookup(0x3020_0073), Some(handler_of("mret")));
    assert_eq!(lookup(0x0220_81B3), Some(handler_of("mul")));
    assert_eq!(lookup(0x0031_00D3), Some(handler_of("fadd.s")));
}

#[test]
fn fcvt_signedness_pairs_are_distinct() {
    assert_eq!(lookup(0xC000_0053), Some(handler_of("fcvt.w.s")));
    assert_eq!(lookup(0xC010_0053), Some(handler_of("fcvt.wu.s")));
    assert_eq!(lookup(0xD200_0053), Some(handler_of("fcvt.d.w")));
    assert_eq!(lookup(0xD210_0053), Some(handler_of("fcvt.d.wu")));
}

#[test]
fn dii_claims_the_zero_halfword() {
    assert_eq!(lookup(0x0000), Some(handler_of("dii")));
    // A real C.ADDI4SPN encoding still routes to its own handler.
    assert_eq!(lookup(0x0044), Some(handler_of("c.addi4spn")));
}

#[test]
fn wildcard_before_exact_pairs() {
    assert_eq!(lookup(0x0001), Some(handler_of("c.nop")));
    assert_eq!(lookup(0x0085), Some(handler_of("c.addi")));
    assert_eq!(lookup(0x8082), Some(handler_of("c.jr")));
    assert_eq!(lookup(0x842A), Some(handler_of("c.mv")));
    assert_eq!(lookup(0x9002), Some(handler_of("c.ebreak")));
    assert_eq!(lookup(0x9082), Some(handler_of("c.jalr")));
    assert_eq!(lookup(0x9086), Some(handler_of("c.add")));
    assert_eq!(lookup(0x6101), Some(handler_of("c.addi16sp")));
    assert_eq!(lookup(0x6285), Some(handler_of("c.lui")));
}

#[test]
fn fully_constrained_descriptors_round_trip() {
    for d in descriptors() {
        let full = if d.size == 32 { 0xFFFF_FFFF } else { 0xFFFF };
        if d.mask == full {
            assert_eq!(
                lookup(d.value),
                Some(d.handler as usize),
                "round-trip failed for {}",
                d.mnemonic
            );
        }
    }
}

#[test]
fn extension_gating_empties_quadrants() {
    let cfg = IsaConfig {
        misa: MisaExt::I.union(MisaExt::M),
        ext_zicsr: true,
        ext_zifencei: false,
    };
    let tables = DecodeTables::build(&cfg);
    // Compressed space is empty.
    assert!(tables.lookup(0x0044).is_none());
    assert!(tables.lookup(0x8082).is_none());
    // FP and fence.i are gone, base and M remain.
    assert!(tables.lookup(0x0031_00D3).is_none());
    assert!(tables.lookup(0x0000_100F).is_none());
    assert!(tables.lookup(0x0070_0293).is_some());
    assert!(tables.lookup(0x0220_81B3).is_some());
}

proptest! {
    /// A well-formed 32-bit word matched by exactly one
    /// descriptor must route to that descriptor's handler.
    #[test]
    fn unique_match_resolves(w in any::<u32>()) {
        let w = w | 0x3;
        let matches: Vec<_> = descriptors()
            .iter()
            .filter(|d| d.size == 32 && (w & d.mask) == d.value)
            .collect();
        if matches.len() == 1 {
            prop_assert_eq!(lookup(w), Some(matches[0].handler as usize));
        }
    }

    /// Every compressed encoding covered by some
    /// descriptor resolves to a handler (never a null slot).
    #[test]
    fn described_compressed_encodings_resolve(di in 0usize..159, fill in any::<u16>()) {
        let d = &descriptors()[di];
        if d.size == 16 {
            let w = d.value | (fill as u32 & !d.mask & 0xFFFF);
            prop_assert!(lookup(w).is_some());
        }
    }
}
