//! BIFF8 parse-thing (`ptg`) ids and token kinds.
//!
//! Opcode values follow [MS-XLS] 2.5.198 (`Ptg`). Classed ptgs (`0x20..=0x3F` in their reference
//! form) are re-tagged with the operand class when emitted; see [`TokenClass`].

use serde::{Deserialize, Serialize};

pub(crate) const PTG_EXP: u8 = 0x01;
pub(crate) const PTG_TBL: u8 = 0x02;
pub(crate) const PTG_STR: u8 = 0x17;
pub(crate) const PTG_ATTR: u8 = 0x19;
pub(crate) const PTG_ERR: u8 = 0x1C;
pub(crate) const PTG_BOOL: u8 = 0x1D;
pub(crate) const PTG_INT: u8 = 0x1E;
pub(crate) const PTG_NUM: u8 = 0x1F;

// Reference-class base ids.
pub(crate) const PTG_ARRAY: u8 = 0x20;
pub(crate) const PTG_FUNC: u8 = 0x21;
pub(crate) const PTG_FUNC_VAR: u8 = 0x22;
pub(crate) const PTG_NAME: u8 = 0x23;
pub(crate) const PTG_REF: u8 = 0x24;
pub(crate) const PTG_AREA: u8 = 0x25;
pub(crate) const PTG_MEM_AREA: u8 = 0x26;
pub(crate) const PTG_MEM_ERR: u8 = 0x27;
pub(crate) const PTG_MEM_NO_MEM: u8 = 0x28;
pub(crate) const PTG_MEM_FUNC: u8 = 0x29;
pub(crate) const PTG_REF_ERR: u8 = 0x2A;
pub(crate) const PTG_AREA_ERR: u8 = 0x2B;
pub(crate) const PTG_REF_N: u8 = 0x2C;
pub(crate) const PTG_AREA_N: u8 = 0x2D;
pub(crate) const PTG_MEM_AREA_N: u8 = 0x2E;
pub(crate) const PTG_MEM_NO_MEM_N: u8 = 0x2F;
pub(crate) const PTG_NAME_X: u8 = 0x39;
pub(crate) const PTG_REF_3D: u8 = 0x3A;
pub(crate) const PTG_AREA_3D: u8 = 0x3B;
pub(crate) const PTG_REF_ERR_3D: u8 = 0x3C;
pub(crate) const PTG_AREA_ERR_3D: u8 = 0x3D;

// PtgAttr sub-opcodes (the `grbit` byte).
pub(crate) const T_ATTR_SEMI: u8 = 0x01;
pub(crate) const T_ATTR_IF: u8 = 0x02;
pub(crate) const T_ATTR_CHOOSE: u8 = 0x04;
pub(crate) const T_ATTR_GOTO: u8 = 0x08;
pub(crate) const T_ATTR_SUM: u8 = 0x10;
pub(crate) const T_ATTR_SPACE: u8 = 0x40;

/// BIFF `iftab` value used for user-defined / add-in / future functions.
pub const FTAB_USER_DEFINED: u16 = 0x00FF;

/// Operand class of a classed ptg.
///
/// The class lives in bits 5-6 of the opcode: a `PtgRef` is `0x24` (reference), `0x44` (value)
/// or `0x64` (array).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenClass {
    #[default]
    Reference,
    Value,
    Array,
}

impl TokenClass {
    pub(crate) fn bits(self) -> u8 {
        match self {
            TokenClass::Reference => 0x20,
            TokenClass::Value => 0x40,
            TokenClass::Array => 0x60,
        }
    }

    /// Apply the class bits to a reference-class base ptg.
    pub(crate) fn apply(self, base: u8) -> u8 {
        (base & 0x1F) | self.bits()
    }
}

/// Binary operators (`PtgAdd` .. `PtgRange`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Power,
    Concat,
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
    Intersect,
    Union,
    Range,
}

impl BinaryOp {
    pub(crate) fn ptg(self) -> u8 {
        match self {
            BinaryOp::Add => 0x03,
            BinaryOp::Sub => 0x04,
            BinaryOp::Mul => 0x05,
            BinaryOp::Div => 0x06,
            BinaryOp::Power => 0x07,
            BinaryOp::Concat => 0x08,
            BinaryOp::Lt => 0x09,
            BinaryOp::Le => 0x0A,
            BinaryOp::Eq => 0x0B,
            BinaryOp::Ge => 0x0C,
            BinaryOp::Gt => 0x0D,
            BinaryOp::Ne => 0x0E,
            BinaryOp::Intersect => 0x0F,
            BinaryOp::Union => 0x10,
            BinaryOp::Range => 0x11,
        }
    }

    pub(crate) fn kind(self) -> PtgKind {
        match self {
            BinaryOp::Intersect => PtgKind::Isect,
            BinaryOp::Union => PtgKind::Union,
            BinaryOp::Range => PtgKind::Range,
            _ => PtgKind::Operator,
        }
    }
}

/// Unary operators and other payload-free tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Plus,
    Minus,
    Percent,
}

impl UnaryOp {
    pub(crate) fn ptg(self) -> u8 {
        match self {
            UnaryOp::Plus => 0x12,
            UnaryOp::Minus => 0x13,
            UnaryOp::Percent => 0x14,
        }
    }
}

/// Class-independent kind of a token, used for context legality checks.
///
/// Arithmetic/comparison operators share [`PtgKind::Operator`]; the operators that carry
/// reference semantics (`Isect`, `Union`, `Range`) are distinct because contexts filter them
/// individually.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PtgKind {
    Exp,
    Tbl,
    Operator,
    Isect,
    Union,
    Range,
    Unary,
    Paren,
    MissArg,
    Str,
    Attr,
    Err,
    Bool,
    Int,
    Num,
    Array,
    Func,
    FuncVar,
    Name,
    Ref,
    Area,
    MemArea,
    MemErr,
    MemNoMem,
    MemFunc,
    RefErr,
    AreaErr,
    RefN,
    AreaN,
    MemAreaN,
    MemNoMemN,
    NameX,
    Ref3d,
    Area3d,
    RefErr3d,
    AreaErr3d,
}

impl PtgKind {
    pub const ALL: [PtgKind; 36] = [
        PtgKind::Exp,
        PtgKind::Tbl,
        PtgKind::Operator,
        PtgKind::Isect,
        PtgKind::Union,
        PtgKind::Range,
        PtgKind::Unary,
        PtgKind::Paren,
        PtgKind::MissArg,
        PtgKind::Str,
        PtgKind::Attr,
        PtgKind::Err,
        PtgKind::Bool,
        PtgKind::Int,
        PtgKind::Num,
        PtgKind::Array,
        PtgKind::Func,
        PtgKind::FuncVar,
        PtgKind::Name,
        PtgKind::Ref,
        PtgKind::Area,
        PtgKind::MemArea,
        PtgKind::MemErr,
        PtgKind::MemNoMem,
        PtgKind::MemFunc,
        PtgKind::RefErr,
        PtgKind::AreaErr,
        PtgKind::RefN,
        PtgKind::AreaN,
        PtgKind::MemAreaN,
        PtgKind::MemNoMemN,
        PtgKind::NameX,
        PtgKind::Ref3d,
        PtgKind::Area3d,
        PtgKind::RefErr3d,
        PtgKind::AreaErr3d,
    ];

    pub(crate) const fn bit(self) -> u64 {
        1u64 << (self as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_bits_retag_reference_ptgs() {
        assert_eq!(TokenClass::Reference.apply(PTG_REF), 0x24);
        assert_eq!(TokenClass::Value.apply(PTG_REF), 0x44);
        assert_eq!(TokenClass::Array.apply(PTG_REF), 0x64);
        assert_eq!(TokenClass::Value.apply(PTG_AREA_3D), 0x5B);
        assert_eq!(TokenClass::Array.apply(PTG_NAME_X), 0x79);
    }

    #[test]
    fn kind_bits_are_distinct() {
        let mut seen = 0u64;
        for kind in PtgKind::ALL {
            assert_eq!(seen & kind.bit(), 0, "duplicate bit for {kind:?}");
            seen |= kind.bit();
        }
    }
}
