//! Guest-core contract.
//!
//! The architectural state (register files, CSR bank, memory, trap and
//! reservation machinery) is owned by the host side of the simulator.
//! The translation core only needs a narrow, read-mostly view of it:
//! address translation and physical reads for instruction fetch, the
//! register index space the emitted code addresses, and the channel
//! tags used by emitted `read_mem`/`write_mem` calls.

use crate::builder::TuBuilder;

/// Address-space channels the emitted code can address.
///
/// `Mem` carries ordinary loads and stores, `Csr` mediated CSR access,
/// `Res` the LR/SC reservation set, and `Fence` is a write-only side
/// channel carrying fence ordering bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrSpace {
    Mem,
    Csr,
    Fence,
    Res,
}

/// Instrumentation phase markers bracketing one instruction's
/// semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Pre,
    Post,
}

/// The architectural-state collaborator.
///
/// Implementations live outside the translation core; the reference
/// implementation used by the test suite is a flat-memory core with
/// the RV32 register layout.
pub trait GuestCore {
    /// Translate a guest virtual address to a physical address.
    fn v2p(&self, vaddr: u32) -> Result<u64, ()>;

    /// Read `buf.len()` bytes of guest memory at a physical address.
    fn read(&self, paddr: u64, buf: &mut [u8]) -> Result<(), ()>;

    /// Total number of registers in the index space.
    fn num_regs(&self) -> u32;

    /// Bit width of register `idx`.
    fn reg_bit_width(&self, idx: u32) -> u32;

    /// Stable name of register `idx`, used for emitted local names.
    fn reg_alias(&self, idx: u32) -> &str;

    // -- Base indices of the architectural register groups --

    /// First integer register (X0..X31 are contiguous from here).
    fn idx_x0(&self) -> u32;
    /// First floating register (F0..F31 are contiguous from here).
    fn idx_f0(&self) -> u32;
    fn idx_pc(&self) -> u32;
    fn idx_next_pc(&self) -> u32;
    fn idx_last_branch(&self) -> u32;
    fn idx_fcsr(&self) -> u32;
    fn idx_trap_state(&self) -> u32;

    /// Guest XLEN in bits (32 for RV32).
    fn xlen(&self) -> u32 {
        32
    }

    /// Page-offset mask (`0xFFF` for 4 KiB pages); `addr & !mask` is
    /// the page number.
    fn page_mask(&self) -> u32 {
        0xFFF
    }

    /// Numeric tag of an address-space channel as passed to the
    /// emitted `read_mem`/`write_mem` helpers.
    fn space_tag(&self, space: AddrSpace) -> u32 {
        match space {
            AddrSpace::Mem => 0,
            AddrSpace::Csr => 1,
            AddrSpace::Fence => 2,
            AddrSpace::Res => 3,
        }
    }

    /// Emit an instrumentation hook for the given phase of the
    /// instruction with the given serial index. The default emits
    /// nothing; cores override this to inject tracing or cycle
    /// accounting into the generated code.
    fn gen_sync(&self, tu: &mut dyn TuBuilder, phase: SyncPhase, serial: u64) {
        let _ = (tu, phase, serial);
    }
}
