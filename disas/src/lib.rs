//! rv2c disassembler.
//!
//! Renders guest instructions as assembly text. The frontend embeds
//! the result in emitted `print_disass` calls; the strings are
//! cosmetic and never fed back into decoding.

pub mod rv32;

pub use rv32::{disasm16, disasm32, print_insn_rv32gc};
