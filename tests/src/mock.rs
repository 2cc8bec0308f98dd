//! Reference guest core used across the test suite.
//!
//! A flat identity-mapped memory plus the RV32 register layout:
//! x0..x31 (32-bit), f0..f31 (64-bit), then pc, next_pc, last_br,
//! fcsr and trap_state. `gen_sync` emits comment markers so tests can
//! observe sync placement in the emitted source.

use rv2c_core::{GuestCore, SyncPhase, TuBuilder};

pub const NUM_REGS: u32 = 69;

pub struct TestCore {
    base: u32,
    mem: Vec<u8>,
    aliases: Vec<String>,
}

impl TestCore {
    /// A core whose memory holds `code` starting at `base`.
    pub fn with_code(base: u32, code: &[u8]) -> Self {
        let mut aliases = Vec::with_capacity(NUM_REGS as usize);
        for i in 0..32 {
            aliases.push(format!("x{i}"));
        }
        for i in 0..32 {
            aliases.push(format!("f{i}"));
        }
        for name in ["pc", "next_pc", "last_br", "fcsr", "trap_state"] {
            aliases.push(name.to_string());
        }
        Self {
            base,
            mem: code.to_vec(),
            aliases,
        }
    }
}

impl GuestCore for TestCore {
    fn v2p(&self, vaddr: u32) -> Result<u64, ()> {
        let off = vaddr.wrapping_sub(self.base);
        if (off as usize) < self.mem.len() {
            Ok(vaddr as u64)
        } else {
            Err(())
        }
    }

    fn read(&self, paddr: u64, buf: &mut [u8]) -> Result<(), ()> {
        let off = (paddr as u32).wrapping_sub(self.base) as usize;
        let end = off.checked_add(buf.len()).ok_or(())?;
        if end > self.mem.len() {
            return Err(());
        }
        buf.copy_from_slice(&self.mem[off..end]);
        Ok(())
    }

    fn num_regs(&self) -> u32 {
        NUM_REGS
    }

    fn reg_bit_width(&self, idx: u32) -> u32 {
        if (32..64).contains(&idx) {
            64
        } else {
            32
        }
    }

    fn reg_alias(&self, idx: u32) -> &str {
        &self.aliases[idx as usize]
    }

    fn idx_x0(&self) -> u32 {
        0
    }

    fn idx_f0(&self) -> u32 {
        32
    }

    fn idx_pc(&self) -> u32 {
        64
    }

    fn idx_next_pc(&self) -> u32 {
        65
    }

    fn idx_last_branch(&self) -> u32 {
        66
    }

    fn idx_fcsr(&self) -> u32 {
        67
    }

    fn idx_trap_state(&self) -> u32 {
        68
    }

    fn gen_sync(&self, tu: &mut dyn TuBuilder, phase: SyncPhase, serial: u64) {
        let phase = match phase {
            SyncPhase::Pre => "pre",
            SyncPhase::Post => "post",
        };
        tu.append(&format!("/* sync {phase} {serial} */"));
    }
}
