//! Typed C expression fragments.

/// A C expression fragment together with the width and signedness of
/// the value it evaluates to.
///
/// Values are cheap, freely clonable strings; materializing one into a
/// named local is the builder's `assignment` operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub txt: String,
    pub bits: u32,
    pub signed: bool,
}

impl Value {
    /// An unsigned expression of the given width.
    pub fn new(txt: impl Into<String>, bits: u32) -> Self {
        Self {
            txt: txt.into(),
            bits,
            signed: false,
        }
    }

    /// A signed expression of the given width.
    pub fn new_signed(txt: impl Into<String>, bits: u32) -> Self {
        Self {
            txt: txt.into(),
            bits,
            signed: true,
        }
    }
}

/// The C scalar type spelling for a width/signedness pair.
pub fn ctype(bits: u32, signed: bool) -> &'static str {
    match (bits, signed) {
        (8, false) => "uint8_t",
        (8, true) => "int8_t",
        (16, false) => "uint16_t",
        (16, true) => "int16_t",
        (32, false) => "uint32_t",
        (32, true) => "int32_t",
        (64, false) => "uint64_t",
        (64, true) => "int64_t",
        _ => panic!("unsupported scalar width {bits}"),
    }
}

/// Comparison predicates understood by `TuBuilder::icmp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpPred {
    Eq,
    Ne,
    /// Unsigned less-than.
    Ult,
    /// Unsigned less-or-equal.
    Ule,
    /// Unsigned greater-than.
    Ugt,
    /// Unsigned greater-or-equal.
    Uge,
    /// Signed less-than.
    Slt,
    /// Signed less-or-equal.
    Sle,
    /// Signed greater-than.
    Sgt,
    /// Signed greater-or-equal.
    Sge,
}

impl CmpPred {
    /// The C operator spelling.
    pub fn op(self) -> &'static str {
        match self {
            CmpPred::Eq => "==",
            CmpPred::Ne => "!=",
            CmpPred::Ult | CmpPred::Slt => "<",
            CmpPred::Ule | CmpPred::Sle => "<=",
            CmpPred::Ugt | CmpPred::Sgt => ">",
            CmpPred::Uge | CmpPred::Sge => ">=",
        }
    }

    /// Whether the operands compare as signed integers.
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            CmpPred::Slt | CmpPred::Sle | CmpPred::Sgt | CmpPred::Sge
        )
    }
}
