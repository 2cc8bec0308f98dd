//! RV32GC translation frontend.
//!
//! `Rv32gcVm` drives one translation unit at a time: fetch the next
//! instruction word from guest memory, classify it through the
//! two-level lookup table, and invoke the handler, which emits the
//! instruction's semantics into the unit builder and reports how the
//! unit continues. The emitted C function executes the unit against
//! the architectural state and returns the next guest PC.

pub mod decode;
pub mod isa;

pub(crate) mod atomic;
pub(crate) mod base;
pub(crate) mod compressed;
pub(crate) mod fpu;
pub(crate) mod muldiv;

pub use base::illegal_instruction;

use std::sync::Arc;

use rv2c_core::trap::{trap_val, CAUSE_ILLEGAL_INSTRUCTION};
use rv2c_core::{
    AddrSpace, CBlockBuilder, GuestCore, RegModel, SyncPhase, TranslationError,
    TuBuilder, Value,
};
use tracing::trace;

use crate::Continuation;
use decode::DecodeTables;
use isa::IsaConfig;

/// A translation handler: emits one instruction's semantics, advances
/// the handler-visible PC by the instruction size, and reports how the
/// unit continues.
pub type Handler = fn(&mut Rv32gcVm, &mut u32, u32) -> Continuation;

/// Default cap on guest instructions per translation unit.
const MAX_INSNS: u32 = 512;

/// The RV32GC translation core.
pub struct Rv32gcVm {
    core: Box<dyn GuestCore>,
    tu: Box<dyn TuBuilder>,
    model: RegModel,
    tables: Arc<DecodeTables>,
    disass: bool,
    max_insns: u32,
    serial: u64,
    last_term: Continuation,
}

impl Rv32gcVm {
    /// Construct with a freshly owned core (the construct-own form).
    pub fn new(core: impl GuestCore + 'static) -> Self {
        Self::with_core(Box::new(core))
    }

    /// Construct around a core the caller boxed (the borrow form: the
    /// Vm still owns the box for the duration of translation).
    pub fn with_core(core: Box<dyn GuestCore>) -> Self {
        Self::with_config(core, IsaConfig::default())
    }

    /// Construct with an explicit extension configuration. The default
    /// RV32GC configuration shares one process-lifetime decode table;
    /// other configurations build their own.
    pub fn with_config(core: Box<dyn GuestCore>, cfg: IsaConfig) -> Self {
        let model = RegModel::from_core(&*core);
        let tu = Box::new(CBlockBuilder::new(model.clone()));
        Self {
            core,
            tu,
            model,
            tables: DecodeTables::get(&cfg),
            disass: false,
            max_insns: MAX_INSNS,
            serial: 0,
            last_term: Continuation::Cont,
        }
    }

    /// Enable or disable `print_disass` emission.
    pub fn set_disass(&mut self, on: bool) {
        self.disass = on;
    }

    pub fn set_max_insns(&mut self, n: u32) {
        self.max_insns = n.max(1);
    }

    /// How the most recently translated unit terminated. `Flush`
    /// obliges the caller to invalidate cached translations.
    pub fn last_continuation(&self) -> Continuation {
        self.last_term
    }

    // ── Block driver ─────────────────────────────────────────────

    /// Translate one unit starting at `start_pc`. Returns the emitted
    /// C source and the number of guest instructions covered.
    pub fn translate_block(
        &mut self,
        start_pc: u32,
    ) -> Result<(String, u32), TranslationError> {
        self.serial = 0;
        self.tu.open_block(&format!("block_0x{:08x}", start_pc));

        let mut pc = start_pc;
        let mut inst_cnt = 0u32;
        let kind = loop {
            let (insn, _size) = match self.fetch(pc) {
                Ok(fetched) => fetched,
                Err(e) => {
                    // Drop the partially built unit so the builder is
                    // clean for the next block.
                    let _ = self.tu.finish();
                    return Err(e);
                }
            };
            trace!("translate pc={pc:#010x} insn={insn:#010x}");
            let handler = self
                .tables
                .lookup(insn)
                .unwrap_or(base::illegal_instruction as Handler);
            let kind = handler(self, &mut pc, insn);
            inst_cnt += 1;
            if kind != Continuation::Cont {
                break kind;
            }
            if inst_cnt >= self.max_insns {
                break Continuation::Cont;
            }
        };
        self.last_term = kind;

        // Shared epilogue: normal exit, then the trap entry reached by
        // the per-instruction checks.
        self.tu.append("return *next_pc;");
        self.tu.label("trap_entry");
        self.tu.append("enter_trap(core_ptr, *trap_state, *pc);");
        let sentinel = self.tu.constant(0xFFFF_FFFF, 32);
        self.tu.store(&sentinel, self.model.last_branch);
        self.tu.append("return *next_pc;");

        Ok((self.tu.finish(), inst_cnt))
    }

    // ── Fetch ────────────────────────────────────────────────────

    /// Fetch up to four bytes of instruction stream at `pc`, honoring
    /// guest page boundaries. Returns the word (low half only for
    /// compressed forms) and the instruction size in bytes.
    fn fetch(&self, pc: u32) -> Result<(u32, u32), TranslationError> {
        let fault = |_| TranslationError::AccessFault { pc };
        let pgmask = self.core.page_mask();
        let mut buf = [0u8; 4];

        if (pc & !pgmask) != (pc.wrapping_add(2) & !pgmask) {
            // The window crosses a page: read the first half, and only
            // translate and read the second half if the instruction is
            // not compressed.
            let p = self.core.v2p(pc).map_err(fault)?;
            self.core.read(p, &mut buf[..2]).map_err(fault)?;
            if buf[0] & 0x3 == 0x3 {
                let p2 = self.core.v2p(pc.wrapping_add(2)).map_err(fault)?;
                self.core.read(p2, &mut buf[2..]).map_err(fault)?;
            }
        } else {
            let p = self.core.v2p(pc).map_err(fault)?;
            self.core.read(p, &mut buf).map_err(fault)?;
        }

        let insn = u32::from_le_bytes(buf);

        // Structural self-loop guards: `jal x0, 0` and `c.j 0` spin
        // forever; stop the simulation instead of translating them.
        if insn == 0x0000_006f || insn & 0xffff == 0xa001 {
            return Err(TranslationError::SimulationStopped { code: 0 });
        }

        let size = if insn & 0x3 == 0x3 { 4 } else { 2 };
        Ok((insn, size))
    }

    // ── Instruction envelope ─────────────────────────────────────

    /// Common prologue of every handler: local label, PRE_SYNC, the
    /// optional disassembly call, the `cur_pc_val` constant, the PC
    /// advance, and the opening of the instruction scope.
    pub(crate) fn begin_insn(
        &mut self,
        mnem: &str,
        pc: &mut u32,
        size: u32,
        insn: u32,
    ) -> Value {
        let cur = *pc;
        self.tu.label(&format!("{}_0x{:08x}", mnem, cur));
        self.core.gen_sync(&mut *self.tu, SyncPhase::Pre, self.serial);
        if self.disass {
            let text = if size == 2 {
                rv2c_disas::disasm16(insn & 0xffff, cur)
            } else {
                rv2c_disas::disasm32(insn, cur)
            };
            self.tu.append(&format!(
                "print_disass(core_ptr, {:#x}U, \"{}\");",
                cur, text
            ));
        }
        let cur_pc_val = self.tu.constant(cur as u64, 32);
        *pc = cur.wrapping_add(size);
        self.tu.open_scope();
        cur_pc_val
    }

    /// Close a non-terminating instruction: scope, NEXT_PC update,
    /// POST_SYNC and trap check.
    pub(crate) fn end_cont(&mut self, fallthrough: u32) -> Continuation {
        self.tu.close_scope();
        let next = self.tu.constant(fallthrough as u64, 32);
        self.tu.store(&next, self.model.next_pc);
        self.post_insn();
        Continuation::Cont
    }

    /// Close a terminating instruction (NEXT_PC was written by the
    /// semantic body).
    pub(crate) fn end_term(&mut self, kind: Continuation) -> Continuation {
        self.tu.close_scope();
        self.post_insn();
        kind
    }

    fn post_insn(&mut self) {
        self.core.gen_sync(&mut *self.tu, SyncPhase::Post, self.serial);
        self.tu.append("if (*trap_state != 0) goto trap_entry;");
        self.serial += 1;
    }

    // ── Register access ──────────────────────────────────────────

    /// Read X register `r`; x0 reads as constant zero.
    pub(crate) fn xload(&mut self, r: u32) -> Value {
        if r == 0 {
            self.tu.constant(0, 32)
        } else {
            self.tu.load(self.model.x0 + r, 0)
        }
    }

    /// Write X register `r`; writes to x0 are suppressed here, in the
    /// handler layer, never by the storage.
    pub(crate) fn xstore(&mut self, r: u32, v: &Value) {
        if r != 0 {
            self.tu.store(v, self.model.x0 + r);
        }
    }

    pub(crate) fn fload(&mut self, r: u32) -> Value {
        self.tu.load(self.model.f0 + r, 0)
    }

    pub(crate) fn fstore64(&mut self, r: u32, v: &Value) {
        self.tu.store(v, self.model.f0 + r);
    }

    /// Write a 32-bit value into the 64-bit F register `r`, NaN-boxed
    /// (upper 32 bits all ones).
    pub(crate) fn fstore_boxed(&mut self, r: u32, v: &Value) {
        let wide = self.tu.ext(v, 64, false);
        let ones = self.tu.constant(0xFFFF_FFFF_0000_0000, 64);
        let boxed = self.tu.l_or(&wide, &ones);
        self.tu.store(&boxed, self.model.f0 + r);
    }

    /// Single-precision view of F register `r`: a local holding
    /// `unbox_s(F[r])` (the canonical-NaN fallback lives in the host
    /// routine).
    pub(crate) fn unbox_s(&mut self, r: u32) -> Value {
        let raw = self.fload(r);
        let call = self.tu.callf("unbox_s", &[raw], 32);
        self.tu.assignment(call, 32)
    }

    pub(crate) fn fcsr_load(&mut self) -> Value {
        self.tu.load(self.model.fcsr, 0)
    }

    pub(crate) fn fcsr_store(&mut self, v: &Value) {
        self.tu.store(v, self.model.fcsr);
    }

    /// Channel tag for emitted `read_mem`/`write_mem` calls.
    pub(crate) fn space(&self, space: AddrSpace) -> u32 {
        self.core.space_tag(space)
    }

    pub(crate) fn set_next_pc(&mut self, v: &Value) {
        self.tu.store(v, self.model.next_pc);
    }

    pub(crate) fn set_next_pc_const(&mut self, v: u32) {
        let c = self.tu.constant(v as u64, 32);
        self.tu.store(&c, self.model.next_pc);
    }

    pub(crate) fn set_last_branch(&mut self, v: u32) {
        let c = self.tu.constant(v as u64, 32);
        self.tu.store(&c, self.model.last_branch);
    }

    pub(crate) fn tu(&mut self) -> &mut dyn TuBuilder {
        &mut *self.tu
    }

    pub(crate) fn tu_ref(&self) -> &dyn TuBuilder {
        &*self.tu
    }

    // ── Shared emission primitives ───────────────────────────────

    /// Mark a pending trap, to be serviced by the per-instruction
    /// check. The architectural PC is updated so `enter_trap` sees
    /// the trapping instruction's address.
    pub(crate) fn gen_raise_trap(&mut self, cur_pc: &Value, trap_id: u16, cause: u16) {
        let v = self.tu.constant(trap_val(trap_id, cause) as u64, 32);
        self.tu.store(&v, self.model.trap_state);
        self.tu.store(cur_pc, self.model.pc);
    }

    /// Convenience: raise illegal-instruction.
    pub(crate) fn gen_illegal(&mut self, cur_pc: &Value) {
        self.gen_raise_trap(cur_pc, 0, CAUSE_ILLEGAL_INSTRUCTION);
    }

    /// Return from a trap at privilege level `lvl`: notify the host,
    /// then fetch the saved EPC (CSR `(lvl << 8) + 0x41`) into
    /// NEXT_PC and mark the branch indirect.
    pub(crate) fn gen_leave_trap(&mut self, lvl: u32) {
        self.tu.append(&format!("leave_trap(core_ptr, {});", lvl));
        let addr = self.tu.constant(((lvl << 8) + 0x41) as u64, 32);
        let csr = self.space(AddrSpace::Csr);
        let epc = self.tu.read_mem(csr, &addr, 32);
        self.set_next_pc(&epc);
        self.set_last_branch(0xFFFF_FFFF);
    }

    /// WFI hook. Emits no semantic effect in this implementation.
    pub(crate) fn gen_wait(&mut self, _units: u32) {}
}
