mod blocks;
mod compressed;
mod decode;
mod fetch;
mod fpu;

use crate::mock::TestCore;
use rv2c_frontend::Rv32gcVm;

/// Little-endian byte stream from 32-bit words.
pub fn words(ws: &[u32]) -> Vec<u8> {
    ws.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// Little-endian byte stream from 16-bit halfwords.
pub fn halves(hs: &[u16]) -> Vec<u8> {
    hs.iter().flat_map(|h| h.to_le_bytes()).collect()
}

pub fn vm_with(base: u32, code: &[u8]) -> Rv32gcVm {
    Rv32gcVm::new(TestCore::with_code(base, code))
}

/// Translate exactly one instruction at `base` and return the source.
/// The code is zero-padded so the trailing 4-byte fetch window stays
/// mapped.
pub fn translate_one(base: u32, code: &[u8]) -> String {
    let mut padded = code.to_vec();
    padded.extend_from_slice(&[0, 0]);
    let mut vm = vm_with(base, &padded);
    vm.set_max_insns(1);
    let (src, n) = vm.translate_block(base).expect("translation failed");
    assert_eq!(n, 1);
    src
}

pub fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}
