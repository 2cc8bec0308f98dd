//! rv2c core — building blocks of the translation engine.
//!
//! Provides the guest-core trait (the seam to the architectural state
//! owned by the host), the translation-unit builder that accumulates
//! emitted C source text, and the trap-state word encoding shared with
//! the frontends.

pub mod arch;
pub mod builder;
pub mod regs;
pub mod trap;
pub mod value;

pub use arch::{AddrSpace, GuestCore, SyncPhase};
pub use builder::{CBlockBuilder, TuBuilder, NUM_CACHED_REGS};
pub use regs::{RegInfo, RegModel};
pub use value::{ctype, CmpPred, Value};

use thiserror::Error;

/// Errors the translation pass can signal across the driver boundary.
///
/// Undecodable instruction words are *not* errors: they dispatch to the
/// illegal-instruction handler, which emits a guest trap instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TranslationError {
    /// Instruction fetch from an unmapped or protected guest address.
    #[error("access fault fetching guest address {pc:#010x}")]
    AccessFault { pc: u32 },
    /// The fetch guard recognized a self-loop idiom; the simulation
    /// should stop with `code`.
    #[error("simulation stopped with exit code {code}")]
    SimulationStopped { code: i32 },
}
