//! Translation-unit builder.
//!
//! A translation unit is one C function: it receives the opaque core
//! pointer and the register-file base pointer, executes the semantics
//! of a linear run of guest instructions, and returns the next guest
//! PC. The builder accumulates the emitted lines, hands out fresh
//! local names, hoists register-pointer declarations to the top of the
//! function, and brackets per-instruction locals in lexical scopes.

use crate::regs::RegModel;
use crate::value::{ctype, CmpPred, Value};

/// Number of integer-register pointers the builder caches per unit.
pub const NUM_CACHED_REGS: usize = 32;

/// Cast `v` to an `(un)signed` integer of `bits` where its current
/// type differs.
fn cast(v: &Value, bits: u32, signed: bool) -> String {
    if v.bits == bits && v.signed == signed {
        v.txt.clone()
    } else {
        format!("(({})({}))", ctype(bits, signed), v.txt)
    }
}

fn bin(a: &Value, op: &str, b: &Value) -> Value {
    let bits = a.bits.max(b.bits);
    Value::new(format!("({} {} {})", a.txt, op, b.txt), bits)
}

/// Builder interface the instruction handlers program against.
///
/// Expression nodes (`add`, `icmp`, `ext`, ...) are pure: they combine
/// fragments without emitting a line. `assignment`, `load`, `store`,
/// `read_mem`, `write_mem` and `append` emit.
pub trait TuBuilder {
    /// Start a new unit: the function header and the control-register
    /// pointer prologue.
    fn open_block(&mut self, name: &str);

    /// Close the unit and return the full source text. Resets the
    /// builder for the next unit.
    fn finish(&mut self) -> String;

    /// An integer literal of the given width.
    fn constant(&self, val: u64, bits: u32) -> Value;

    /// Materialize `expr` into a fresh local of the given width and
    /// return the local.
    fn assignment(&mut self, expr: Value, bits: u32) -> Value;

    /// Read register `reg_idx`. `level` is the context nesting depth;
    /// only level 0 (the current unit) is supported.
    fn load(&mut self, reg_idx: u32, level: u32) -> Value;

    /// Write `expr` to register `reg_idx`.
    ///
    /// The builder performs the store unconditionally; suppressing
    /// writes to X0 is the handlers' responsibility.
    fn store(&mut self, expr: &Value, reg_idx: u32);

    /// Emit a channel read of `bits` bits and return the loaded value.
    fn read_mem(&mut self, space_tag: u32, addr: &Value, bits: u32) -> Value;

    /// Emit a channel write of `expr.bits` truncated to `bits` bits.
    fn write_mem(&mut self, space_tag: u32, addr: &Value, expr: &Value, bits: u32);

    /// A call expression `name(args...)` returning `ret_bits` bits.
    fn callf(&self, name: &str, args: &[Value], ret_bits: u32) -> Value;

    /// Emit a raw statement line at the current indentation.
    fn append(&mut self, line: &str);

    /// Emit a label at column zero.
    fn label(&mut self, name: &str);

    fn open_scope(&mut self);
    fn close_scope(&mut self);

    /// Which X-register pointers have been materialized in this unit.
    fn defined_regs(&self) -> &[bool; NUM_CACHED_REGS];

    // -- Expression nodes --

    fn add(&self, a: &Value, b: &Value) -> Value {
        bin(a, "+", b)
    }
    fn sub(&self, a: &Value, b: &Value) -> Value {
        bin(a, "-", b)
    }
    fn mul(&self, a: &Value, b: &Value) -> Value {
        bin(a, "*", b)
    }
    fn udiv(&self, a: &Value, b: &Value) -> Value {
        let bits = a.bits.max(b.bits);
        Value::new(
            format!("({} / {})", cast(a, bits, false), cast(b, bits, false)),
            bits,
        )
    }
    fn sdiv(&self, a: &Value, b: &Value) -> Value {
        let bits = a.bits.max(b.bits);
        Value::new_signed(
            format!("({} / {})", cast(a, bits, true), cast(b, bits, true)),
            bits,
        )
    }
    fn urem(&self, a: &Value, b: &Value) -> Value {
        let bits = a.bits.max(b.bits);
        Value::new(
            format!("({} % {})", cast(a, bits, false), cast(b, bits, false)),
            bits,
        )
    }
    fn srem(&self, a: &Value, b: &Value) -> Value {
        let bits = a.bits.max(b.bits);
        Value::new_signed(
            format!("({} % {})", cast(a, bits, true), cast(b, bits, true)),
            bits,
        )
    }
    fn shl(&self, a: &Value, b: &Value) -> Value {
        Value::new(format!("({} << {})", cast(a, a.bits, false), b.txt), a.bits)
    }
    fn lshr(&self, a: &Value, b: &Value) -> Value {
        Value::new(format!("({} >> {})", cast(a, a.bits, false), b.txt), a.bits)
    }
    fn ashr(&self, a: &Value, b: &Value) -> Value {
        Value::new_signed(format!("({} >> {})", cast(a, a.bits, true), b.txt), a.bits)
    }
    fn l_and(&self, a: &Value, b: &Value) -> Value {
        bin(a, "&", b)
    }
    fn l_or(&self, a: &Value, b: &Value) -> Value {
        bin(a, "|", b)
    }
    fn l_xor(&self, a: &Value, b: &Value) -> Value {
        bin(a, "^", b)
    }
    fn l_not(&self, a: &Value) -> Value {
        Value::new(format!("(~{})", cast(a, a.bits, false)), a.bits)
    }
    fn neg(&self, a: &Value) -> Value {
        Value::new(format!("(-{})", cast(a, a.bits, false)), a.bits)
    }

    /// Comparison yielding 0 or 1.
    fn icmp(&self, pred: CmpPred, a: &Value, b: &Value) -> Value {
        let bits = a.bits.max(b.bits);
        let signed = pred.is_signed();
        Value::new(
            format!(
                "({} {} {})",
                cast(a, bits, signed),
                pred.op(),
                cast(b, bits, signed)
            ),
            32,
        )
    }

    /// Ternary select. Only the taken arm is evaluated in C, which the
    /// division handlers rely on.
    fn choose(&self, cond: &Value, a: &Value, b: &Value) -> Value {
        Value::new(
            format!("({} ? {} : {})", cond.txt, a.txt, b.txt),
            a.bits.max(b.bits),
        )
    }

    /// Widen (or re-type) `v` to `bits`, sign- or zero-extending from
    /// its current width.
    fn ext(&self, v: &Value, bits: u32, is_signed: bool) -> Value {
        let txt = if v.bits == bits {
            format!("(({})({}))", ctype(bits, is_signed), v.txt)
        } else {
            format!(
                "(({})({})({}))",
                ctype(bits, is_signed),
                ctype(v.bits, is_signed),
                v.txt
            )
        };
        Value {
            txt,
            bits,
            signed: is_signed,
        }
    }

    /// Truncate `v` to its low `bits` bits.
    fn trunc(&self, v: &Value, bits: u32) -> Value {
        Value::new(format!("(({})({}))", ctype(bits, false), v.txt), bits)
    }
}

/// The C-source implementation of `TuBuilder`.
pub struct CBlockBuilder {
    model: RegModel,
    fn_name: String,
    decls: Vec<String>,
    body: Vec<String>,
    defined_regs: [bool; NUM_CACHED_REGS],
    sym: u64,
    depth: usize,
}

impl CBlockBuilder {
    pub fn new(model: RegModel) -> Self {
        Self {
            model,
            fn_name: String::new(),
            decls: Vec::new(),
            body: Vec::new(),
            defined_regs: [false; NUM_CACHED_REGS],
            sym: 0,
            depth: 0,
        }
    }

    pub fn model(&self) -> &RegModel {
        &self.model
    }

    fn fresh(&mut self) -> String {
        let name = format!("tmp_{}", self.sym);
        self.sym += 1;
        name
    }

    fn indent(&self) -> String {
        "    ".repeat(1 + self.depth)
    }

    fn ptr_decl(&self, name: &str, bits: u32, offset: u32) -> String {
        format!(
            "{} *{} = ({} *)(regs_ptr + {});",
            ctype(bits, false),
            name,
            ctype(bits, false),
            offset
        )
    }

    /// The emitted lvalue for a register, materializing the pointer
    /// local for X registers on first use.
    fn reg_lvalue(&mut self, reg_idx: u32) -> (String, u32) {
        let info = self.model.info(reg_idx).clone();
        if let Some(name) = self.model.control_name(reg_idx) {
            return (format!("*{}", name), info.bits);
        }
        if reg_idx >= self.model.x0 && reg_idx < self.model.x0 + 32 {
            let n = (reg_idx - self.model.x0) as usize;
            if !self.defined_regs[n] {
                let decl = self.ptr_decl(&info.alias, info.bits, info.offset);
                self.decls.push(decl);
                self.defined_regs[n] = true;
            }
            return (format!("*{}", info.alias), info.bits);
        }
        // F registers and anything else: inline cast-dereference,
        // not cached.
        (
            format!(
                "(*(({} *)(regs_ptr + {})))",
                ctype(info.bits, false),
                info.offset
            ),
            info.bits,
        )
    }
}

impl TuBuilder for CBlockBuilder {
    fn open_block(&mut self, name: &str) {
        self.fn_name = name.to_string();
        // Control-register pointers are part of every unit's prologue.
        for idx in [
            self.model.pc,
            self.model.next_pc,
            self.model.trap_state,
            self.model.last_branch,
            self.model.fcsr,
        ] {
            let info = self.model.info(idx).clone();
            let name = self
                .model
                .control_name(idx)
                .expect("control register without a fixed name");
            let decl = self.ptr_decl(name, info.bits, info.offset);
            self.decls.push(decl);
        }
    }

    fn finish(&mut self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "uint32_t {}(uint8_t *core_ptr, uint8_t *regs_ptr) {{\n",
            self.fn_name
        ));
        for d in &self.decls {
            out.push_str("    ");
            out.push_str(d);
            out.push('\n');
        }
        for l in &self.body {
            out.push_str(l);
            out.push('\n');
        }
        out.push_str("}\n");

        self.fn_name.clear();
        self.decls.clear();
        self.body.clear();
        self.defined_regs = [false; NUM_CACHED_REGS];
        self.sym = 0;
        self.depth = 0;
        out
    }

    fn constant(&self, val: u64, bits: u32) -> Value {
        let suffix = if bits == 64 { "ULL" } else { "U" };
        Value::new(format!("{:#x}{}", val, suffix), bits)
    }

    fn assignment(&mut self, expr: Value, bits: u32) -> Value {
        let name = self.fresh();
        let line = format!(
            "{} {} = {};",
            ctype(bits, false),
            name,
            cast(&expr, bits, false)
        );
        let line = format!("{}{}", self.indent(), line);
        self.body.push(line);
        Value::new(name, bits)
    }

    fn load(&mut self, reg_idx: u32, level: u32) -> Value {
        debug_assert_eq!(level, 0, "nested translation contexts are unsupported");
        let (lvalue, bits) = self.reg_lvalue(reg_idx);
        Value::new(lvalue, bits)
    }

    fn store(&mut self, expr: &Value, reg_idx: u32) {
        let (lvalue, bits) = self.reg_lvalue(reg_idx);
        let line = format!("{}{} = {};", self.indent(), lvalue, cast(expr, bits, false));
        self.body.push(line);
    }

    fn read_mem(&mut self, space_tag: u32, addr: &Value, bits: u32) -> Value {
        let name = self.fresh();
        let line = format!(
            "{}{} {} = read_mem{}(core_ptr, {}, {});",
            self.indent(),
            ctype(bits, false),
            name,
            bits,
            space_tag,
            cast(addr, 32, false)
        );
        self.body.push(line);
        Value::new(name, bits)
    }

    fn write_mem(&mut self, space_tag: u32, addr: &Value, expr: &Value, bits: u32) {
        let line = format!(
            "{}write_mem{}(core_ptr, {}, {}, {});",
            self.indent(),
            bits,
            space_tag,
            cast(addr, 32, false),
            cast(expr, bits, false)
        );
        self.body.push(line);
    }

    fn callf(&self, name: &str, args: &[Value], ret_bits: u32) -> Value {
        let args = args
            .iter()
            .map(|a| a.txt.clone())
            .collect::<Vec<_>>()
            .join(", ");
        Value::new(format!("{}({})", name, args), ret_bits)
    }

    fn append(&mut self, line: &str) {
        let line = format!("{}{}", self.indent(), line);
        self.body.push(line);
    }

    fn label(&mut self, name: &str) {
        self.body.push(format!("{}:", name));
    }

    fn open_scope(&mut self) {
        let line = format!("{}{{", self.indent());
        self.body.push(line);
        self.depth += 1;
    }

    fn close_scope(&mut self) {
        debug_assert!(self.depth > 0, "unbalanced scope");
        self.depth -= 1;
        let line = format!("{}}}", self.indent());
        self.body.push(line);
    }

    fn defined_regs(&self) -> &[bool; NUM_CACHED_REGS] {
        &self.defined_regs
    }
}
