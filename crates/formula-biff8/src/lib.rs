//! BIFF8 (`.xls`) formula token encoder.
//!
//! This crate turns a parsed formula, expressed as a [`TokenStream`] in evaluation (RPN) order,
//! into the binary `rgce` stream stored in BIFF8 `FORMULA`, `NAME`, `DV`, `CF` and chart records:
//! - `encode_rgce`: encode a token stream for a given [`FormulaContext`]
//! - `is_token_allowed`: per-context token legality
//!
//! Tokens that are not legal in the target context are replaced by `PtgErr #REF!` rather than
//! rejected; out-of-range references and oversized literals are errors.
//!
//! Notes on jumps:
//! - `tAttrIf`, `tAttrGoto`, `tAttrChoose` and `PtgMem*` carry *logical* targets (token indices).
//!   They are converted to byte distances only after every token, including the add-in name
//!   operands of future functions, has its final position.
//! - Array constants and `PtgMemArea` area lists are written to the trailing `rgcb` block, see
//!   [`EncodedRgce::rgcb`].

mod context;
mod error;
mod literal;
mod names;
mod ptg;
mod reference;
mod rgce;
mod token;

pub use context::{is_token_allowed, FormulaContext};
pub use error::{ArrayDimension, CodecError, EncodeRgceError};
pub use literal::{write_biff_string, BiffString, FormatRun, LengthPrefix};
pub use names::{DefinedNames, NameEntry, NameTable};
pub use ptg::{BinaryOp, PtgKind, TokenClass, UnaryOp, FTAB_USER_DEFINED};
pub use rgce::{encode_rgce, EncodedRgce};
pub use token::{
    AreaBounds, AreaRef, ArrayConstant, ArrayValue, Attr, CellRef, ErrorCode, FunctionId, MemOp,
    SpaceKind, Token, TokenCursor, TokenStream,
};
