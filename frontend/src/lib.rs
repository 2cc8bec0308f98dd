//! rv2c frontend — guest instruction decoding and C-source emission.
//!
//! The frontend maps fetched instruction words to translation handlers
//! through a two-level lookup table and drives one translation unit at
//! a time: fetch, classify, emit, until a terminating instruction.

pub mod bitutil;
pub mod rv32gc;

pub use rv32gc::isa::{IsaConfig, MisaExt};
pub use rv32gc::Rv32gcVm;

/// How an instruction terminates (or continues) a translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Fall through to the next sequential instruction.
    Cont,
    /// End of unit: direct or indirect branch, or a raised trap.
    Branch,
    /// End of unit, and the caller must also invalidate cached
    /// translations for the guest address space (FENCE.I).
    Flush,
}
