//! Per-context token legality.
//!
//! The same token stream grammar is shared by cell formulas, defined names, data validation,
//! conditional formatting and chart series, but each record type only accepts a subset of ptgs.
//! Tokens that are illegal in the target context are replaced by a `PtgErr #REF!` pair instead of
//! failing the encode.

use serde::{Deserialize, Serialize};

use crate::ptg::{PtgKind, PTG_ERR};

/// Record type the encoded formula is destined for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaContext {
    /// Cell (`FORMULA`), shared (`SHRFMLA`) and array (`ARRAY`) formulas.
    #[default]
    Normal,
    /// Defined names (`NAME.rgce`).
    Name,
    /// Data validation criteria (`DV`).
    DataValidation,
    /// Conditional formatting rules (`CF`).
    ConditionalFormat,
    /// Chart series / link formulas (`BRAI`).
    Chart,
}

/// `PtgErr #REF!`, written in place of a token the context does not accept.
pub(crate) const CONTEXT_SENTINEL: [u8; 2] = [PTG_ERR, 0x17];

const fn mask(kinds: &[PtgKind]) -> u64 {
    let mut bits = 0u64;
    let mut i = 0;
    while i < kinds.len() {
        bits |= kinds[i].bit();
        i += 1;
    }
    bits
}

const ALL: u64 = mask(&PtgKind::ALL);

const NAME_ALLOWED: u64 = ALL
    & !mask(&[
        PtgKind::Tbl,
        PtgKind::Exp,
        PtgKind::Ref,
        PtgKind::Area,
        PtgKind::RefErr,
        PtgKind::AreaErr,
        PtgKind::RefN,
        PtgKind::AreaN,
    ]);

const DATA_VALIDATION_ALLOWED: u64 = ALL
    & !mask(&[
        PtgKind::Tbl,
        PtgKind::Exp,
        PtgKind::Isect,
        PtgKind::Union,
        PtgKind::Array,
        PtgKind::Ref3d,
        PtgKind::Area3d,
        PtgKind::RefErr3d,
        PtgKind::AreaErr3d,
        PtgKind::NameX,
        PtgKind::MemArea,
        PtgKind::MemAreaN,
    ]);

// Same as data validation, except that 3-D ranges are accepted.
const CONDITIONAL_FORMAT_ALLOWED: u64 = DATA_VALIDATION_ALLOWED | PtgKind::Area3d.bit();

const CHART_ALLOWED: u64 = mask(&[
    PtgKind::Paren,
    PtgKind::Union,
    PtgKind::Ref3d,
    PtgKind::Area3d,
    PtgKind::RefErr3d,
    PtgKind::AreaErr3d,
    PtgKind::NameX,
    PtgKind::MemFunc,
]);

impl FormulaContext {
    fn allowed_mask(self) -> u64 {
        match self {
            FormulaContext::Normal => ALL,
            FormulaContext::Name => NAME_ALLOWED,
            FormulaContext::DataValidation => DATA_VALIDATION_ALLOWED,
            FormulaContext::ConditionalFormat => CONDITIONAL_FORMAT_ALLOWED,
            FormulaContext::Chart => CHART_ALLOWED,
        }
    }

    /// Whether `kind` may be written into a formula of this context.
    pub fn allows(self, kind: PtgKind) -> bool {
        self.allowed_mask() & kind.bit() != 0
    }
}

/// Whether tokens of `kind` are legal in `context`.
pub fn is_token_allowed(context: FormulaContext, kind: PtgKind) -> bool {
    context.allows(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::ErrorCode;

    #[test]
    fn normal_context_accepts_everything() {
        for kind in PtgKind::ALL {
            assert!(FormulaContext::Normal.allows(kind), "{kind:?}");
        }
    }

    #[test]
    fn name_context_rejects_sheet_local_references() {
        for kind in [
            PtgKind::Tbl,
            PtgKind::Exp,
            PtgKind::Ref,
            PtgKind::Area,
            PtgKind::RefErr,
            PtgKind::AreaErr,
        ] {
            assert!(!FormulaContext::Name.allows(kind), "{kind:?}");
        }
        assert!(FormulaContext::Name.allows(PtgKind::Ref3d));
        assert!(FormulaContext::Name.allows(PtgKind::Area3d));
        assert!(FormulaContext::Name.allows(PtgKind::FuncVar));
    }

    #[test]
    fn conditional_format_differs_from_data_validation_only_for_area3d() {
        for kind in PtgKind::ALL {
            let dv = FormulaContext::DataValidation.allows(kind);
            let cf = FormulaContext::ConditionalFormat.allows(kind);
            if kind == PtgKind::Area3d {
                assert!(!dv && cf);
            } else {
                assert_eq!(dv, cf, "{kind:?}");
            }
        }
        assert!(!FormulaContext::ConditionalFormat.allows(PtgKind::Ref3d));
        assert!(!FormulaContext::DataValidation.allows(PtgKind::MemArea));
        assert!(FormulaContext::DataValidation.allows(PtgKind::MemFunc));
    }

    #[test]
    fn chart_context_is_an_allow_list() {
        let allowed: Vec<PtgKind> = PtgKind::ALL
            .into_iter()
            .filter(|kind| FormulaContext::Chart.allows(*kind))
            .collect();
        assert_eq!(
            allowed,
            vec![
                PtgKind::Union,
                PtgKind::Paren,
                PtgKind::MemFunc,
                PtgKind::NameX,
                PtgKind::Ref3d,
                PtgKind::Area3d,
                PtgKind::RefErr3d,
                PtgKind::AreaErr3d,
            ]
        );
    }

    #[test]
    fn sentinel_is_ref_error() {
        assert_eq!(CONTEXT_SENTINEL, [PTG_ERR, ErrorCode::Ref.code()]);
    }
}
