//! Two-level decode classifier.
//!
//! The first level is the quadrant (the low two bits of the fetched
//! word); the second is a per-quadrant lookup table indexed by a
//! fingerprint folded out of the quadrant's "interesting" bits. The
//! tables are expanded from a flat descriptor list: each descriptor is
//! installed at every index whose selected bits match its value, with
//! don't-care bits enumerated. The list is ordered wildcard-first, so
//! a later, more tightly masked descriptor claims the shared slots
//! (C.NOP over C.ADDI, DII over C.ADDI4SPN, ...).

use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::debug;

use super::isa::{Ext, IsaConfig};
use super::{atomic, base, compressed, fpu, muldiv, Handler};

/// Selected bits of a compressed word, after the quadrant bits are
/// stripped: everything.
pub const EXTR_MASK16: u32 = 0xFFFF >> 2;

/// Selected bits of a 32-bit word, after the quadrant bits are
/// stripped: bits [31:20] (funct7 and the rs2/imm field it overlaps),
/// funct3 and the opcode.
pub const EXTR_MASK32: u32 = 0xFFF0_707F >> 2;

fn quadrant_mask(q: u32) -> u32 {
    if q == 3 {
        EXTR_MASK32
    } else {
        EXTR_MASK16
    }
}

/// Fold the bits of `val` selected by `mask` into an index,
/// high-to-low.
fn fold_fields(val: u32, mask: u32) -> usize {
    let mut idx = 0usize;
    let mut pos = 29i32;
    while pos >= 0 {
        if mask & (1 << pos) != 0 {
            idx = (idx << 1) | ((val >> pos) & 1) as usize;
        }
        pos -= 1;
    }
    idx
}

/// Fingerprint of a fetched word: the index into its quadrant's table.
pub fn extract_fields(word: u32) -> usize {
    fold_fields(word >> 2, quadrant_mask(word & 0x3))
}

/// One entry of the descriptor list.
pub struct InstrDescriptor {
    /// Encoding size in bits (16 or 32).
    pub size: u32,
    pub value: u32,
    pub mask: u32,
    pub ext: Ext,
    pub mnemonic: &'static str,
    pub handler: Handler,
}

/// The four per-quadrant lookup tables. Immutable once built.
pub struct DecodeTables {
    lut: [Vec<Option<Handler>>; 4],
}

static DEFAULT_TABLES: Lazy<Arc<DecodeTables>> =
    Lazy::new(|| Arc::new(DecodeTables::build(&IsaConfig::RV32GC)));

impl DecodeTables {
    /// Tables for `cfg`; the default RV32GC configuration shares one
    /// process-lifetime instance.
    pub fn get(cfg: &IsaConfig) -> Arc<DecodeTables> {
        if *cfg == IsaConfig::RV32GC {
            DEFAULT_TABLES.clone()
        } else {
            Arc::new(DecodeTables::build(cfg))
        }
    }

    pub fn build(cfg: &IsaConfig) -> DecodeTables {
        let mut lut: [Vec<Option<Handler>>; 4] = [
            vec![None; 1 << EXTR_MASK16.count_ones()],
            vec![None; 1 << EXTR_MASK16.count_ones()],
            vec![None; 1 << EXTR_MASK16.count_ones()],
            vec![None; 1 << EXTR_MASK32.count_ones()],
        ];
        // Which descriptor owns each slot, to verify the
        // wildcard-before-exact list ordering in debug builds.
        let mut owner: [Vec<Option<&InstrDescriptor>>; 4] = [
            vec![None; lut[0].len()],
            vec![None; lut[1].len()],
            vec![None; lut[2].len()],
            vec![None; lut[3].len()],
        ];

        let mut installed = 0usize;
        for d in INSTR_DESCRIPTORS.iter() {
            if !cfg.enabled(d.ext) {
                continue;
            }
            installed += 1;
            let q = (d.value & 0x3) as usize;
            let qmask = quadrant_mask(q as u32);
            let sel = (d.mask >> 2) & qmask;
            let val = (d.value >> 2) & sel;
            let free = qmask & !sel;

            // Enumerate every assignment of the don't-care bits.
            let mut sub = free;
            loop {
                let idx = fold_fields(val | sub, qmask);
                if let Some(prev) = owner[q][idx] {
                    debug_assert!(
                        d.mask.count_ones() >= prev.mask.count_ones(),
                        "descriptor {} overwrites stricter {} at {q}:{idx}",
                        d.mnemonic,
                        prev.mnemonic,
                    );
                }
                owner[q][idx] = Some(d);
                lut[q][idx] = Some(d.handler);
                if sub == 0 {
                    break;
                }
                sub = (sub - 1) & free;
            }
        }

        debug!(descriptors = installed, "decode tables built");
        DecodeTables { lut }
    }

    /// Route a fetched word to its handler, or `None` for an illegal
    /// instruction.
    pub fn lookup(&self, insn: u32) -> Option<Handler> {
        let q = (insn & 0x3) as usize;
        self.lut[q][extract_fields(insn)]
    }
}

/// The descriptor list.
pub fn descriptors() -> &'static [InstrDescriptor] {
    &INSTR_DESCRIPTORS
}

macro_rules! instr {
    ($size:literal, $value:literal, $mask:literal, $ext:ident, $mnem:literal, $handler:path) => {
        InstrDescriptor {
            size: $size,
            value: $value,
            mask: $mask,
            ext: Ext::$ext,
            mnemonic: $mnem,
            handler: $handler,
        }
    };
}

#[rustfmt::skip]
static INSTR_DESCRIPTORS: [InstrDescriptor; 159] = [
    // ── RV32I ────────────────────────────────────────────────────
    instr!(32, 0x0000_0037, 0x0000_007F, I, "lui",    base::lui),
    instr!(32, 0x0000_0017, 0x0000_007F, I, "auipc",  base::auipc),
    instr!(32, 0x0000_006F, 0x0000_007F, I, "jal",    base::jal),
    instr!(32, 0x0000_0067, 0x0000_707F, I, "jalr",   base::jalr),
    instr!(32, 0x0000_0063, 0x0000_707F, I, "beq",    base::beq),
    instr!(32, 0x0000_1063, 0x0000_707F, I, "bne",    base::bne),
    instr!(32, 0x0000_4063, 0x0000_707F, I, "blt",    base::blt),
    instr!(32, 0x0000_5063, 0x0000_707F, I, "bge",    base::bge),
    instr!(32, 0x0000_6063, 0x0000_707F, I, "bltu",   base::bltu),
    instr!(32, 0x0000_7063, 0x0000_707F, I, "bgeu",   base::bgeu),
    instr!(32, 0x0000_0003, 0x0000_707F, I, "lb",     base::lb),
    instr!(32, 0x0000_1003, 0x0000_707F, I, "lh",     base::lh),
    instr!(32, 0x0000_2003, 0x0000_707F, I, "lw",     base::lw),
    instr!(32, 0x0000_4003, 0x0000_707F, I, "lbu",    base::lbu),
    instr!(32, 0x0000_5003, 0x0000_707F, I, "lhu",    base::lhu),
    instr!(32, 0x0000_0023, 0x0000_707F, I, "sb",     base::sb),
    instr!(32, 0x0000_1023, 0x0000_707F, I, "sh",     base::sh),
    instr!(32, 0x0000_2023, 0x0000_707F, I, "sw",     base::sw),
    instr!(32, 0x0000_0013, 0x0000_707F, I, "addi",   base::addi),
    instr!(32, 0x0000_2013, 0x0000_707F, I, "slti",   base::slti),
    instr!(32, 0x0000_3013, 0x0000_707F, I, "sltiu",  base::sltiu),
    instr!(32, 0x0000_4013, 0x0000_707F, I, "xori",   base::xori),
    instr!(32, 0x0000_6013, 0x0000_707F, I, "ori",    base::ori),
    instr!(32, 0x0000_7013, 0x0000_707F, I, "andi",   base::andi),
    instr!(32, 0x0000_1013, 0xFE00_707F, I, "slli",   base::slli),
    instr!(32, 0x0000_5013, 0xFE00_707F, I, "srli",   base::srli),
    instr!(32, 0x4000_5013, 0xFE00_707F, I, "srai",   base::srai),
    instr!(32, 0x0000_0033, 0xFE00_707F, I, "add",    base::add),
    instr!(32, 0x4000_0033, 0xFE00_707F, I, "sub",    base::sub),
    instr!(32, 0x0000_1033, 0xFE00_707F, I, "sll",    base::sll),
    instr!(32, 0x0000_2033, 0xFE00_707F, I, "slt",    base::slt),
    instr!(32, 0x0000_3033, 0xFE00_707F, I, "sltu",   base::sltu),
    instr!(32, 0x0000_4033, 0xFE00_707F, I, "xor",    base::xor),
    instr!(32, 0x0000_5033, 0xFE00_707F, I, "srl",    base::srl),
    instr!(32, 0x4000_5033, 0xFE00_707F, I, "sra",    base::sra),
    instr!(32, 0x0000_6033, 0xFE00_707F, I, "or",     base::or),
    instr!(32, 0x0000_7033, 0xFE00_707F, I, "and",    base::and),
    instr!(32, 0x0000_000F, 0x0000_707F, I, "fence",  base::fence),
    instr!(32, 0x0000_100F, 0x0000_707F, Zifencei, "fence.i", base::fence_i),
    instr!(32, 0x0000_0073, 0xFFFF_FFFF, I, "ecall",  base::ecall),
    instr!(32, 0x0010_0073, 0xFFFF_FFFF, I, "ebreak", base::ebreak),
    instr!(32, 0x0020_0073, 0xFFFF_FFFF, I, "uret",   base::uret),
    instr!(32, 0x1020_0073, 0xFFFF_FFFF, I, "sret",   base::sret),
    instr!(32, 0x3020_0073, 0xFFFF_FFFF, I, "mret",   base::mret),
    instr!(32, 0x1050_0073, 0xFFFF_FFFF, I, "wfi",    base::wfi),
    instr!(32, 0x1200_0073, 0xFE00_7FFF, I, "sfence.vma", base::sfence_vma),
    instr!(32, 0x0000_1073, 0x0000_707F, Zicsr, "csrrw",  base::csrrw),
    instr!(32, 0x0000_2073, 0x0000_707F, Zicsr, "csrrs",  base::csrrs),
    instr!(32, 0x0000_3073, 0x0000_707F, Zicsr, "csrrc",  base::csrrc),
    instr!(32, 0x0000_5073, 0x0000_707F, Zicsr, "csrrwi", base::csrrwi),
    instr!(32, 0x0000_6073, 0x0000_707F, Zicsr, "csrrsi", base::csrrsi),
    instr!(32, 0x0000_7073, 0x0000_707F, Zicsr, "csrrci", base::csrrci),
    // ── M ────────────────────────────────────────────────────────
    instr!(32, 0x0200_0033, 0xFE00_707F, M, "mul",    muldiv::mul),
    instr!(32, 0x0200_1033, 0xFE00_707F, M, "mulh",   muldiv::mulh),
    instr!(32, 0x0200_2033, 0xFE00_707F, M, "mulhsu", muldiv::mulhsu),
    instr!(32, 0x0200_3033, 0xFE00_707F, M, "mulhu",  muldiv::mulhu),
    instr!(32, 0x0200_4033, 0xFE00_707F, M, "div",    muldiv::div),
    instr!(32, 0x0200_5033, 0xFE00_707F, M, "divu",   muldiv::divu),
    instr!(32, 0x0200_6033, 0xFE00_707F, M, "rem",    muldiv::rem),
    instr!(32, 0x0200_7033, 0xFE00_707F, M, "remu",   muldiv::remu),
    // ── A ────────────────────────────────────────────────────────
    instr!(32, 0x1000_202F, 0xF9F0_707F, A, "lr.w",      atomic::lr_w),
    instr!(32, 0x1800_202F, 0xF800_707F, A, "sc.w",      atomic::sc_w),
    instr!(32, 0x0800_202F, 0xF800_707F, A, "amoswap.w", atomic::amoswap_w),
    instr!(32, 0x0000_202F, 0xF800_707F, A, "amoadd.w",  atomic::amoadd_w),
    instr!(32, 0x2000_202F, 0xF800_707F, A, "amoxor.w",  atomic::amoxor_w),
    instr!(32, 0x6000_202F, 0xF800_707F, A, "amoand.w",  atomic::amoand_w),
    instr!(32, 0x4000_202F, 0xF800_707F, A, "amoor.w",   atomic::amoor_w),
    instr!(32, 0x8000_202F, 0xF800_707F, A, "amomin.w",  atomic::amomin_w),
    instr!(32, 0xA000_202F, 0xF800_707F, A, "amomax.w",  atomic::amomax_w),
    instr!(32, 0xC000_202F, 0xF800_707F, A, "amominu.w", atomic::amominu_w),
    instr!(32, 0xE000_202F, 0xF800_707F, A, "amomaxu.w", atomic::amomaxu_w),
    // ── F ────────────────────────────────────────────────────────
    instr!(32, 0x0000_2007, 0x0000_707F, F, "flw",      fpu::flw),
    instr!(32, 0x0000_2027, 0x0000_707F, F, "fsw",      fpu::fsw),
    instr!(32, 0x0000_0043, 0x0600_007F, F, "fmadd.s",  fpu::fmadd_s),
    instr!(32, 0x0000_0047, 0x0600_007F, F, "fmsub.s",  fpu::fmsub_s),
    instr!(32, 0x0000_004B, 0x0600_007F, F, "fnmsub.s", fpu::fnmsub_s),
    instr!(32, 0x0000_004F, 0x0600_007F, F, "fnmadd.s", fpu::fnmadd_s),
    instr!(32, 0x0000_0053, 0xFE00_007F, F, "fadd.s",   fpu::fadd_s),
    instr!(32, 0x0800_0053, 0xFE00_007F, F, "fsub.s",   fpu::fsub_s),
    instr!(32, 0x1000_0053, 0xFE00_007F, F, "fmul.s",   fpu::fmul_s),
    instr!(32, 0x1800_0053, 0xFE00_007F, F, "fdiv.s",   fpu::fdiv_s),
    instr!(32, 0x5800_0053, 0xFFF0_007F, F, "fsqrt.s",  fpu::fsqrt_s),
    instr!(32, 0x2000_0053, 0xFE00_707F, F, "fsgnj.s",  fpu::fsgnj_s),
    instr!(32, 0x2000_1053, 0xFE00_707F, F, "fsgnjn.s", fpu::fsgnjn_s),
    instr!(32, 0x2000_2053, 0xFE00_707F, F, "fsgnjx.s", fpu::fsgnjx_s),
    instr!(32, 0x2800_0053, 0xFE00_707F, F, "fmin.s",   fpu::fmin_s),
    instr!(32, 0x2800_1053, 0xFE00_707F, F, "fmax.s",   fpu::fmax_s),
    instr!(32, 0xC000_0053, 0xFFF0_007F, F, "fcvt.w.s",  fpu::fcvt_w_s),
    instr!(32, 0xC010_0053, 0xFFF0_007F, F, "fcvt.wu.s", fpu::fcvt_wu_s),
    instr!(32, 0xA000_2053, 0xFE00_707F, F, "feq.s",    fpu::feq_s),
    instr!(32, 0xA000_1053, 0xFE00_707F, F, "flt.s",    fpu::flt_s),
    instr!(32, 0xA000_0053, 0xFE00_707F, F, "fle.s",    fpu::fle_s),
    instr!(32, 0xE000_1053, 0xFFF0_707F, F, "fclass.s", fpu::fclass_s),
    instr!(32, 0xD000_0053, 0xFFF0_007F, F, "fcvt.s.w",  fpu::fcvt_s_w),
    instr!(32, 0xD010_0053, 0xFFF0_007F, F, "fcvt.s.wu", fpu::fcvt_s_wu),
    instr!(32, 0xE000_0053, 0xFFF0_707F, F, "fmv.x.w",  fpu::fmv_x_w),
    instr!(32, 0xF000_0053, 0xFFF0_707F, F, "fmv.w.x",  fpu::fmv_w_x),
    // ── D ────────────────────────────────────────────────────────
    instr!(32, 0x0000_3007, 0x0000_707F, D, "fld",      fpu::fld),
    instr!(32, 0x0000_3027, 0x0000_707F, D, "fsd",      fpu::fsd),
    instr!(32, 0x0200_0043, 0x0600_007F, D, "fmadd.d",  fpu::fmadd_d),
    instr!(32, 0x0200_0047, 0x0600_007F, D, "fmsub.d",  fpu::fmsub_d),
    instr!(32, 0x0200_004B, 0x0600_007F, D, "fnmsub.d", fpu::fnmsub_d),
    instr!(32, 0x0200_004F, 0x0600_007F, D, "fnmadd.d", fpu::fnmadd_d),
    instr!(32, 0x0200_0053, 0xFE00_007F, D, "fadd.d",   fpu::fadd_d),
    instr!(32, 0x0A00_0053, 0xFE00_007F, D, "fsub.d",   fpu::fsub_d),
    instr!(32, 0x1200_0053, 0xFE00_007F, D, "fmul.d",   fpu::fmul_d),
    instr!(32, 0x1A00_0053, 0xFE00_007F, D, "fdiv.d",   fpu::fdiv_d),
    instr!(32, 0x5A00_0053, 0xFFF0_007F, D, "fsqrt.d",  fpu::fsqrt_d),
    instr!(32, 0x2200_0053, 0xFE00_707F, D, "fsgnj.d",  fpu::fsgnj_d),
    instr!(32, 0x2200_1053, 0xFE00_707F, D, "fsgnjn.d", fpu::fsgnjn_d),
    instr!(32, 0x2200_2053, 0xFE00_707F, D, "fsgnjx.d", fpu::fsgnjx_d),
    instr!(32, 0x2A00_0053, 0xFE00_707F, D, "fmin.d",   fpu::fmin_d),
    instr!(32, 0x2A00_1053, 0xFE00_707F, D, "fmax.d",   fpu::fmax_d),
    instr!(32, 0x4010_0053, 0xFFF0_007F, D, "fcvt.s.d", fpu::fcvt_s_d),
    instr!(32, 0x4200_0053, 0xFFF0_007F, D, "fcvt.d.s", fpu::fcvt_d_s),
    instr!(32, 0xA200_2053, 0xFE00_707F, D, "feq.d",    fpu::feq_d),
    instr!(32, 0xA200_1053, 0xFE00_707F, D, "flt.d",    fpu::flt_d),
    instr!(32, 0xA200_0053, 0xFE00_707F, D, "fle.d",    fpu::fle_d),
    instr!(32, 0xE200_1053, 0xFFF0_707F, D, "fclass.d", fpu::fclass_d),
    instr!(32, 0xC200_0053, 0xFFF0_007F, D, "fcvt.w.d",  fpu::fcvt_w_d),
    instr!(32, 0xC210_0053, 0xFFF0_007F, D, "fcvt.wu.d", fpu::fcvt_wu_d),
    instr!(32, 0xD200_0053, 0xFFF0_007F, D, "fcvt.d.w",  fpu::fcvt_d_w),
    instr!(32, 0xD210_0053, 0xFFF0_007F, D, "fcvt.d.wu", fpu::fcvt_d_wu),
    // ── C, quadrant 0 ────────────────────────────────────────────
    instr!(16, 0x0000, 0xE003, C, "c.addi4spn", compressed::c_addi4spn),
    instr!(16, 0x2000, 0xE003, C, "c.fld",      compressed::c_fld),
    instr!(16, 0x4000, 0xE003, C, "c.lw",       compressed::c_lw),
    instr!(16, 0x6000, 0xE003, C, "c.flw",      compressed::c_flw),
    instr!(16, 0xA000, 0xE003, C, "c.fsd",      compressed::c_fsd),
    instr!(16, 0xC000, 0xE003, C, "c.sw",       compressed::c_sw),
    instr!(16, 0xE000, 0xE003, C, "c.fsw",      compressed::c_fsw),
    // Designated illegal: the all-zero halfword. Listed after
    // C.ADDI4SPN with a full mask, so it claims the shared slot.
    instr!(16, 0x0000, 0xFFFF, C, "dii",        compressed::dii),
    // ── C, quadrant 1 ────────────────────────────────────────────
    instr!(16, 0x0001, 0xE003, C, "c.addi",     compressed::c_addi),
    instr!(16, 0x0001, 0xEF83, C, "c.nop",      compressed::c_nop),
    instr!(16, 0x2001, 0xE003, C, "c.jal",      compressed::c_jal),
    instr!(16, 0x4001, 0xE003, C, "c.li",       compressed::c_li),
    instr!(16, 0x6001, 0xE003, C, "c.lui",      compressed::c_lui),
    instr!(16, 0x6101, 0xEF83, C, "c.addi16sp", compressed::c_addi16sp),
    instr!(16, 0x8001, 0xFC03, C, "c.srli",     compressed::c_srli),
    instr!(16, 0x8401, 0xFC03, C, "c.srai",     compressed::c_srai),
    instr!(16, 0x8801, 0xEC03, C, "c.andi",     compressed::c_andi),
    instr!(16, 0x8C01, 0xFC63, C, "c.sub",      compressed::c_sub),
    instr!(16, 0x8C21, 0xFC63, C, "c.xor",      compressed::c_xor),
    instr!(16, 0x8C41, 0xFC63, C, "c.or",       compressed::c_or),
    instr!(16, 0x8C61, 0xFC63, C, "c.and",      compressed::c_and),
    instr!(16, 0xA001, 0xE003, C, "c.j",        compressed::c_j),
    instr!(16, 0xC001, 0xE003, C, "c.beqz",     compressed::c_beqz),
    instr!(16, 0xE001, 0xE003, C, "c.bnez",     compressed::c_bnez),
    // ── C, quadrant 2 ────────────────────────────────────────────
    instr!(16, 0x0002, 0xF003, C, "c.slli",     compressed::c_slli),
    instr!(16, 0x2002, 0xE003, C, "c.fldsp",    compressed::c_fldsp),
    instr!(16, 0x4002, 0xE003, C, "c.lwsp",     compressed::c_lwsp),
    instr!(16, 0x6002, 0xE003, C, "c.flwsp",    compressed::c_flwsp),
    instr!(16, 0x8002, 0xF003, C, "c.mv",       compressed::c_mv),
    instr!(16, 0x8002, 0xF07F, C, "c.jr",       compressed::c_jr),
    instr!(16, 0x9002, 0xF003, C, "c.add",      compressed::c_add),
    instr!(16, 0x9002, 0xF07F, C, "c.jalr",     compressed::c_jalr),
    instr!(16, 0x9002, 0xFFFF, C, "c.ebreak",   compressed::c_ebreak),
    instr!(16, 0xA002, 0xE003, C, "c.fsdsp",    compressed::c_fsdsp),
    instr!(16, 0xC002, 0xE003, C, "c.swsp",     compressed::c_swsp),
    instr!(16, 0xE002, 0xE003, C, "c.fswsp",    compressed::c_fswsp),
];
