//! Future/add-in function calls.
//!
//! BIFF8 has no function-table entry for functions introduced after Excel 2003. They are written
//! as `PtgFuncVar(iftab=0x00FF)` with one extra argument: a `PtgName` that points at an add-in
//! placeholder `NAME` record (`_xlfn.IFS`, ...). The name token must be evaluated first, so it is
//! spliced in front of the call's first argument after the main pass has run.

use std::collections::BTreeMap;

use super::emit::Emitted;
use crate::error::EncodeRgceError;
use crate::names::NameTable;
use crate::ptg::{TokenClass, PTG_NAME};
use crate::token::{Token, TokenStream};

/// `PtgName`: `[ptg][nameIndex: u16][reserved: u16]`
const NAME_TOKEN_LEN: usize = 5;

/// Logical index in front of which the name operand of the call at `call` is inserted.
///
/// Walks back over `argc` complete operands using each token's stack effect. A `PtgMem*` marker
/// directly in front of the first operand belongs to it when its sub-expression ends before the
/// call; a marker whose sub-expression contains the call stays in front of the name. Whitespace
/// and volatile attributes in front of the first operand are skipped as well.
pub(super) fn insertion_point(
    tokens: &TokenStream,
    call: usize,
    argc: usize,
) -> Result<usize, EncodeRgceError> {
    let mut cursor = tokens.cursor();
    cursor.seek(call);

    let mut pending = argc;
    while pending > 0 {
        let token = cursor.prev().ok_or(EncodeRgceError::InvalidToken {
            index: call,
            reason: "future function call has fewer operands than its argument count",
        })?;
        let (pops, pushes) = token.stack_effect();
        pending = pending + pops - pushes;
    }

    while let Some(token) = cursor.peek_prev() {
        let belongs_to_operand = match token {
            Token::Mem { end, .. } => *end <= call,
            _ => token.is_ignorable_marker(),
        };
        if !belongs_to_operand {
            break;
        }
        cursor.prev();
    }
    Ok(cursor.position())
}

/// Splice one `PtgName` per recorded future-function call, in call order.
///
/// Every offset and pending jump field at or after a splice point moves by
/// [`NAME_TOKEN_LEN`] bytes. When several calls share an insertion point (a future call nested as
/// the first argument of another), the outer call's name goes first so that names stay in
/// evaluation order.
pub(super) fn splice_names<N: NameTable + ?Sized>(
    out: &mut Emitted<'_>,
    tokens: &TokenStream,
    names: &N,
) -> Result<(), EncodeRgceError> {
    let sites = std::mem::take(&mut out.future_sites);
    // logical insertion index -> byte offset of the earliest name spliced there
    let mut spliced: BTreeMap<usize, usize> = BTreeMap::new();

    for site in &sites {
        let argc = match tokens.get(site.index) {
            Some(Token::FuncVar { argc, .. }) => *argc as usize,
            _ => {
                return Err(EncodeRgceError::InvalidToken {
                    index: site.index,
                    reason: "future function site is not a PtgFuncVar",
                })
            }
        };

        let name_index =
            names
                .add_in_index(site.name)
                .ok_or_else(|| EncodeRgceError::FutureFunctionNameNotFound {
                    index: site.index,
                    name: site.name.to_string(),
                })?;

        let logical = insertion_point(tokens, site.index, argc)?;
        let at = spliced
            .get(&logical)
            .copied()
            .unwrap_or(out.offsets[logical]);

        let mut name_token = [0u8; NAME_TOKEN_LEN];
        name_token[0] = TokenClass::Reference.apply(PTG_NAME);
        name_token[1..3].copy_from_slice(&name_index.to_le_bytes());
        out.rgce.splice(at..at, name_token);

        out.shift(at, NAME_TOKEN_LEN);
        for byte in spliced.values_mut().filter(|byte| **byte >= at) {
            *byte += NAME_TOKEN_LEN;
        }
        spliced.insert(logical, at);

        log::debug!(
            "spliced add-in name {name_index} for `{}` (token {}) at byte {at}",
            site.name,
            site.index
        );
    }
    Ok(())
}
