//! Single forward pass over the token stream.
//!
//! Produces the raw `rgce`, the `rgcb` side data, the logical-index -> byte-offset table, the
//! pending jump fixups and the list of future-function call sites. Jump fields are written as
//! zero placeholders here and resolved by [`super::relocate`].

use std::collections::BTreeMap;

use crate::context::{FormulaContext, CONTEXT_SENTINEL};
use crate::error::EncodeRgceError;
use crate::literal::{self, BiffString, LengthPrefix};
use crate::ptg::*;
use crate::reference::{self, Addressing};
use crate::token::{Attr, FunctionId, MemOp, Token, TokenStream};

/// `cparams` keeps the argument count in its low 7 bits.
const MAX_FUNC_VAR_ARGS: u8 = 0x7F;

/// How a jump field is computed from its target offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum JumpKind {
    /// `tAttrIf`: bytes from the end of the field to the target.
    If,
    /// `tAttrGoto`: bytes from the end of the field to the target, minus one.
    Goto,
    /// `tAttrChoose` jump table entry: bytes from the field itself to the target.
    Choose,
    /// `PtgMem*` `cce`: bytes from the end of the field to the target.
    Mem,
}

/// A 2-byte jump field waiting for its target's final offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct Fixup {
    /// Token that owns the field.
    pub(super) source: usize,
    /// Logical index of the jump target.
    pub(super) target: usize,
    pub(super) kind: JumpKind,
}

/// Variable-arity call that needs an add-in name token spliced in front of its arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct FutureFunctionSite<'a> {
    pub(super) index: usize,
    pub(super) name: &'a str,
}

#[derive(Debug, Default)]
pub(super) struct Emitted<'a> {
    pub(super) rgce: Vec<u8>,
    pub(super) rgcb: Vec<u8>,
    /// `offsets[i]` is the byte offset of token `i`; the last entry is the `rgce` length.
    pub(super) offsets: Vec<usize>,
    /// Field offset -> pending fixup.
    pub(super) fixups: BTreeMap<usize, Fixup>,
    pub(super) future_sites: Vec<FutureFunctionSite<'a>>,
}

impl<'a> Emitted<'a> {
    /// Length of the main token stream (excludes `rgcb`).
    pub(super) fn cce(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Move every recorded offset and fixup field at or after `at` by `by` bytes.
    pub(super) fn shift(&mut self, at: usize, by: usize) {
        for offset in self.offsets.iter_mut().filter(|offset| **offset >= at) {
            *offset += by;
        }
        let fixups = std::mem::take(&mut self.fixups);
        self.fixups = fixups
            .into_iter()
            .map(|(field, fixup)| (if field >= at { field + by } else { field }, fixup))
            .collect();
    }

    fn reserve_jump(
        &mut self,
        source: usize,
        target: usize,
        kind: JumpKind,
        len: usize,
    ) -> Result<(), EncodeRgceError> {
        if target > len {
            return Err(EncodeRgceError::JumpTargetOutOfRange {
                index: source,
                target,
                len,
            });
        }
        let field = self.rgce.len();
        self.rgce.extend_from_slice(&[0, 0]);
        self.fixups.insert(
            field,
            Fixup {
                source,
                target,
                kind,
            },
        );
        Ok(())
    }

    fn push_u16(&mut self, value: u16) {
        self.rgce.extend_from_slice(&value.to_le_bytes());
    }
}

pub(super) fn emit(
    tokens: &TokenStream,
    context: FormulaContext,
) -> Result<Emitted<'_>, EncodeRgceError> {
    let mut out = Emitted {
        rgce: Vec::with_capacity(tokens.len().saturating_mul(4)),
        offsets: Vec::with_capacity(tokens.len() + 1),
        ..Default::default()
    };

    for (index, token) in tokens.iter().enumerate() {
        out.offsets.push(out.rgce.len());

        if !context.allows(token.kind()) {
            log::trace!(
                "token {index} ({:?}) is not allowed in {context:?} formulas; writing #REF!",
                token.kind()
            );
            out.rgce.extend_from_slice(&CONTEXT_SENTINEL);
            continue;
        }

        emit_token(&mut out, index, token, tokens.len())?;
    }

    out.offsets.push(out.rgce.len());
    Ok(out)
}

fn emit_token<'a>(
    out: &mut Emitted<'a>,
    index: usize,
    token: &'a Token,
    len: usize,
) -> Result<(), EncodeRgceError> {
    match token {
        Token::SharedFormula { row, col } => {
            out.rgce.push(PTG_EXP);
            out.push_u16(*row);
            out.push_u16(*col);
        }
        Token::Table { row, col } => {
            out.rgce.push(PTG_TBL);
            out.push_u16(*row);
            out.push_u16(*col);
        }
        Token::Binary { op } => out.rgce.push(op.ptg()),
        Token::Unary { op } => out.rgce.push(op.ptg()),
        Token::Paren => out.rgce.push(0x15),
        Token::MissingArg => out.rgce.push(0x16),
        Token::Str { value } => {
            out.rgce.push(PTG_STR);
            literal::write_biff_string(&mut out.rgce, &BiffString::plain(value), LengthPrefix::U8)
                .map_err(|err| err.at(index))?;
        }
        Token::Error { value } => {
            out.rgce.push(PTG_ERR);
            literal::write_error(&mut out.rgce, *value);
        }
        Token::Bool { value } => {
            out.rgce.push(PTG_BOOL);
            literal::write_bool(&mut out.rgce, *value);
        }
        Token::Int { value } => {
            out.rgce.push(PTG_INT);
            out.push_u16(*value);
        }
        Token::Number { value } => {
            out.rgce.push(PTG_NUM);
            literal::write_number(&mut out.rgce, *value);
        }
        Token::Array { class, value } => {
            // PtgArray: 7 unused bytes; the constant itself lives in rgcb.
            out.rgce.push(class.apply(PTG_ARRAY));
            out.rgce.extend_from_slice(&[0u8; 7]);
            literal::write_array(&mut out.rgcb, value).map_err(|err| err.at(index))?;
        }
        Token::Func { class, iftab, .. } => {
            out.rgce.push(class.apply(PTG_FUNC));
            out.push_u16(*iftab);
        }
        Token::FuncVar {
            class,
            argc,
            function,
        } => {
            if *argc > MAX_FUNC_VAR_ARGS
                || (matches!(function, FunctionId::Future(_)) && *argc == MAX_FUNC_VAR_ARGS)
            {
                return Err(EncodeRgceError::InvalidToken {
                    index,
                    reason: "too many arguments for PtgFuncVar",
                });
            }
            out.rgce.push(class.apply(PTG_FUNC_VAR));
            match function {
                FunctionId::Builtin(iftab) => {
                    out.rgce.push(*argc);
                    out.push_u16(*iftab);
                }
                FunctionId::Future(name) => {
                    // The add-in name token counts as the first argument.
                    out.rgce.push(*argc + 1);
                    out.push_u16(FTAB_USER_DEFINED);
                    out.future_sites.push(FutureFunctionSite {
                        index,
                        name: name.as_str(),
                    });
                }
            }
        }
        Token::Name { class, index: name } => {
            out.rgce.push(class.apply(PTG_NAME));
            out.push_u16(*name);
            out.push_u16(0);
        }
        Token::NameX {
            class,
            ixti,
            index: name,
        } => {
            out.rgce.push(class.apply(PTG_NAME_X));
            out.push_u16(*ixti);
            out.push_u16(*name);
            out.push_u16(0);
        }
        Token::Ref { class, cell } => {
            out.rgce.push(class.apply(PTG_REF));
            reference::write_cell(&mut out.rgce, cell, Addressing::Absolute)
                .map_err(|err| err.at(index))?;
        }
        Token::Area { class, area } => {
            out.rgce.push(class.apply(PTG_AREA));
            reference::write_area(&mut out.rgce, area, Addressing::Absolute)
                .map_err(|err| err.at(index))?;
        }
        Token::RefErr { class, cell } => {
            out.rgce.push(class.apply(PTG_REF_ERR));
            reference::write_cell(&mut out.rgce, cell, Addressing::Absolute)
                .map_err(|err| err.at(index))?;
        }
        Token::AreaErr { class, area } => {
            out.rgce.push(class.apply(PTG_AREA_ERR));
            reference::write_area(&mut out.rgce, area, Addressing::Absolute)
                .map_err(|err| err.at(index))?;
        }
        Token::RefN { class, cell } => {
            out.rgce.push(class.apply(PTG_REF_N));
            reference::write_cell(&mut out.rgce, cell, Addressing::Offset)
                .map_err(|err| err.at(index))?;
        }
        Token::AreaN { class, area } => {
            out.rgce.push(class.apply(PTG_AREA_N));
            reference::write_area(&mut out.rgce, area, Addressing::Offset)
                .map_err(|err| err.at(index))?;
        }
        Token::Ref3d { class, ixti, cell } => {
            out.rgce.push(class.apply(PTG_REF_3D));
            reference::write_cell_3d(&mut out.rgce, *ixti, cell).map_err(|err| err.at(index))?;
        }
        Token::Area3d { class, ixti, area } => {
            out.rgce.push(class.apply(PTG_AREA_3D));
            reference::write_area_3d(&mut out.rgce, *ixti, area).map_err(|err| err.at(index))?;
        }
        Token::RefErr3d { class, ixti, cell } => {
            out.rgce.push(class.apply(PTG_REF_ERR_3D));
            reference::write_cell_3d(&mut out.rgce, *ixti, cell).map_err(|err| err.at(index))?;
        }
        Token::AreaErr3d { class, ixti, area } => {
            out.rgce.push(class.apply(PTG_AREA_ERR_3D));
            reference::write_area_3d(&mut out.rgce, *ixti, area).map_err(|err| err.at(index))?;
        }
        Token::Attr { attr } => emit_attr(out, index, attr, len)?,
        Token::Mem { class, op, end } => emit_mem(out, index, *class, op, *end, len)?,
    }
    Ok(())
}

fn emit_attr(
    out: &mut Emitted<'_>,
    index: usize,
    attr: &Attr,
    len: usize,
) -> Result<(), EncodeRgceError> {
    out.rgce.push(PTG_ATTR);
    match attr {
        Attr::Volatile => {
            out.rgce.push(T_ATTR_SEMI);
            out.push_u16(0);
        }
        Attr::If { target } => {
            out.rgce.push(T_ATTR_IF);
            out.reserve_jump(index, *target, JumpKind::If, len)?;
        }
        Attr::Goto { target } => {
            out.rgce.push(T_ATTR_GOTO);
            out.reserve_jump(index, *target, JumpKind::Goto, len)?;
        }
        Attr::Choose { targets } => {
            // wAttr is the number of cases; the table has one more entry than that.
            let cases = targets
                .len()
                .checked_sub(1)
                .and_then(|cases| u16::try_from(cases).ok())
                .ok_or(EncodeRgceError::InvalidToken {
                    index,
                    reason: "tAttrChoose needs between 1 and 65536 jump targets",
                })?;
            out.rgce.push(T_ATTR_CHOOSE);
            out.push_u16(cases);
            for target in targets {
                out.reserve_jump(index, *target, JumpKind::Choose, len)?;
            }
        }
        Attr::Sum => {
            out.rgce.push(T_ATTR_SUM);
            out.push_u16(0);
        }
        Attr::Space { kind, count } => {
            out.rgce.push(T_ATTR_SPACE);
            out.rgce.push(kind.code());
            out.rgce.push(*count);
        }
    }
    Ok(())
}

fn emit_mem(
    out: &mut Emitted<'_>,
    index: usize,
    class: TokenClass,
    op: &MemOp,
    end: usize,
    len: usize,
) -> Result<(), EncodeRgceError> {
    let (base, reserved) = match op {
        MemOp::Area { .. } => (PTG_MEM_AREA, true),
        MemOp::Err => (PTG_MEM_ERR, true),
        MemOp::NoMem => (PTG_MEM_NO_MEM, false),
        MemOp::Func => (PTG_MEM_FUNC, false),
        MemOp::AreaN => (PTG_MEM_AREA_N, false),
        MemOp::NoMemN => (PTG_MEM_NO_MEM_N, false),
    };

    out.rgce.push(class.apply(base));
    if reserved {
        out.rgce.extend_from_slice(&[0u8; 4]);
    }
    out.reserve_jump(index, end, JumpKind::Mem, len)?;

    if let MemOp::Area { areas } = op {
        // PtgExtraMem: [cref: u16][Ref8U; cref]
        let cref = u16::try_from(areas.len()).map_err(|_| EncodeRgceError::InvalidToken {
            index,
            reason: "PtgMemArea area list is longer than 65535 entries",
        })?;
        out.rgcb.extend_from_slice(&cref.to_le_bytes());
        for area in areas {
            out.rgcb.extend_from_slice(&reference::clamp_row(area.first_row).to_le_bytes());
            out.rgcb.extend_from_slice(&reference::clamp_row(area.last_row).to_le_bytes());
            out.rgcb.extend_from_slice(&reference::clamp_col(area.first_col).to_le_bytes());
            out.rgcb.extend_from_slice(&reference::clamp_col(area.last_col).to_le_bytes());
        }
    }
    Ok(())
}
