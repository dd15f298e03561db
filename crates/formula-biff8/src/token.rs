//! Parsed formula tokens, as handed to the encoder by the formula parser.
//!
//! Tokens are in RPN order. Jump-style tokens (`tAttrIf`, `tAttrGoto`, `tAttrChoose`, and the
//! `PtgMem*` family) carry the *logical index* of the token they jump to; byte offsets are only
//! known once the whole stream has been emitted.

use serde::{Deserialize, Serialize};

use crate::ptg::{BinaryOp, PtgKind, TokenClass, UnaryOp};

/// Excel error literal, stored as its BIFF error code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Null,
    Div0,
    Value,
    Ref,
    Name,
    Num,
    #[serde(rename = "na")]
    NA,
    GettingData,
}

impl ErrorCode {
    /// The BIFF error byte (`PtgErr`, `SerErr`, `BOOLERR`).
    pub fn code(self) -> u8 {
        match self {
            ErrorCode::Null => 0x00,
            ErrorCode::Div0 => 0x07,
            ErrorCode::Value => 0x0F,
            ErrorCode::Ref => 0x17,
            ErrorCode::Name => 0x1D,
            ErrorCode::Num => 0x24,
            ErrorCode::NA => 0x2A,
            ErrorCode::GettingData => 0x2B,
        }
    }

    pub fn literal(self) -> &'static str {
        match self {
            ErrorCode::Null => "#NULL!",
            ErrorCode::Div0 => "#DIV/0!",
            ErrorCode::Value => "#VALUE!",
            ErrorCode::Ref => "#REF!",
            ErrorCode::Name => "#NAME?",
            ErrorCode::Num => "#NUM!",
            ErrorCode::NA => "#N/A",
            ErrorCode::GettingData => "#GETTING_DATA",
        }
    }
}

/// A single cell coordinate with relative flags.
///
/// For absolute coordinates `row`/`col` are 0-based indices. For the relative-offset token kinds
/// (`PtgRefN`, `PtgAreaN`) a relative component is a signed offset from the formula cell instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRef {
    pub row: i32,
    pub col: i32,
    #[serde(default)]
    pub row_relative: bool,
    #[serde(default)]
    pub col_relative: bool,
}

impl CellRef {
    /// Absolute (`$A$1`-style) reference to a 0-based cell.
    pub fn absolute(row: i32, col: i32) -> Self {
        Self {
            row,
            col,
            row_relative: false,
            col_relative: false,
        }
    }

    /// Fully relative (`A1`-style) reference.
    pub fn relative(row: i32, col: i32) -> Self {
        Self {
            row,
            col,
            row_relative: true,
            col_relative: true,
        }
    }
}

/// Rectangular range between two corners.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AreaRef {
    pub first: CellRef,
    pub last: CellRef,
}

impl AreaRef {
    pub fn new(first: CellRef, last: CellRef) -> Self {
        Self { first, last }
    }
}

/// Bounds of one contiguous sub-range in a `PtgMemArea` area list (0-based, inclusive).
///
/// Values past the BIFF8 row/column ceilings are clamped when written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AreaBounds {
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u32,
    pub last_col: u32,
}

/// One cell of an array literal (`{1,"a";TRUE,#N/A}`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ArrayValue {
    Empty,
    Number(f64),
    Str(String),
    Bool(bool),
    Error(ErrorCode),
}

/// A 2-D array literal stored row-major.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayConstant {
    pub rows: Vec<Vec<ArrayValue>>,
}

impl ArrayConstant {
    pub fn new(rows: Vec<Vec<ArrayValue>>) -> Self {
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }
}

/// Function identity carried by a variable-arity call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionId {
    /// Built-in function with a native `iftab`.
    Builtin(u16),
    /// Function without a native `iftab`; encoded as a call through an add-in placeholder name
    /// (e.g. `_xlfn.IFS`).
    Future(String),
}

/// `tAttrSpace` whitespace kind ([MS-XLS] 2.5.198.38).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceKind {
    SpaceBeforeBaseExpr,
    CarriageReturnBeforeBaseExpr,
    SpaceBeforeOpenParen,
    CarriageReturnBeforeOpenParen,
    SpaceBeforeCloseParen,
    CarriageReturnBeforeCloseParen,
    SpaceBeforeExpr,
}

impl SpaceKind {
    pub(crate) fn code(self) -> u8 {
        match self {
            SpaceKind::SpaceBeforeBaseExpr => 0x00,
            SpaceKind::CarriageReturnBeforeBaseExpr => 0x01,
            SpaceKind::SpaceBeforeOpenParen => 0x02,
            SpaceKind::CarriageReturnBeforeOpenParen => 0x03,
            SpaceKind::SpaceBeforeCloseParen => 0x04,
            SpaceKind::CarriageReturnBeforeCloseParen => 0x05,
            SpaceKind::SpaceBeforeExpr => 0x06,
        }
    }
}

/// `PtgAttr` forms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "attr", rename_all = "snake_case")]
pub enum Attr {
    /// `tAttrSemi`: marks the formula volatile.
    Volatile,
    /// `tAttrIf`: skip to `target` when the condition is false.
    If { target: usize },
    /// `tAttrChoose`: one jump target per case plus a final target past the last case.
    Choose { targets: Vec<usize> },
    /// `tAttrGoto` (a.k.a. `tAttrSkip`): unconditional jump to `target`.
    Goto { target: usize },
    /// `tAttrSum`: single-argument `SUM`.
    Sum,
    /// `tAttrSpace`: whitespace preserved from the formula text.
    Space { kind: SpaceKind, count: u8 },
}

impl Attr {
    /// Whitespace and volatile markers carry no operand semantics.
    pub(crate) fn is_ignorable(&self) -> bool {
        matches!(self, Attr::Volatile | Attr::Space { .. })
    }
}

/// `PtgMem*` sub-expression markers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mem", rename_all = "snake_case")]
pub enum MemOp {
    /// `PtgMemArea`, with the precomputed area list written to `rgcb`.
    Area { areas: Vec<AreaBounds> },
    Err,
    NoMem,
    Func,
    AreaN,
    NoMemN,
}

/// One formula token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "ptg", rename_all = "snake_case")]
pub enum Token {
    /// `PtgExp`: pointer to the shared/array formula anchored at `(row, col)`.
    SharedFormula { row: u16, col: u16 },
    /// `PtgTbl`: pointer to a data table anchored at `(row, col)`.
    Table { row: u16, col: u16 },
    Binary { op: BinaryOp },
    Unary { op: UnaryOp },
    Paren,
    MissingArg,
    Str { value: String },
    Error { value: ErrorCode },
    Bool { value: bool },
    Int { value: u16 },
    Number { value: f64 },
    Array {
        #[serde(default)]
        class: TokenClass,
        value: ArrayConstant,
    },
    /// Fixed-arity call. `argc` comes from the function table and is not written.
    Func {
        #[serde(default)]
        class: TokenClass,
        iftab: u16,
        argc: u8,
    },
    FuncVar {
        #[serde(default)]
        class: TokenClass,
        argc: u8,
        function: FunctionId,
    },
    /// `PtgName`; `index` is 1-based.
    Name {
        #[serde(default)]
        class: TokenClass,
        index: u16,
    },
    /// `PtgNameX`: name defined in another workbook (or an add-in).
    NameX {
        #[serde(default)]
        class: TokenClass,
        ixti: u16,
        index: u16,
    },
    Ref {
        #[serde(default)]
        class: TokenClass,
        cell: CellRef,
    },
    Area {
        #[serde(default)]
        class: TokenClass,
        area: AreaRef,
    },
    RefErr {
        #[serde(default)]
        class: TokenClass,
        cell: CellRef,
    },
    AreaErr {
        #[serde(default)]
        class: TokenClass,
        area: AreaRef,
    },
    RefN {
        #[serde(default)]
        class: TokenClass,
        cell: CellRef,
    },
    AreaN {
        #[serde(default)]
        class: TokenClass,
        area: AreaRef,
    },
    Ref3d {
        #[serde(default)]
        class: TokenClass,
        ixti: u16,
        cell: CellRef,
    },
    Area3d {
        #[serde(default)]
        class: TokenClass,
        ixti: u16,
        area: AreaRef,
    },
    RefErr3d {
        #[serde(default)]
        class: TokenClass,
        ixti: u16,
        cell: CellRef,
    },
    AreaErr3d {
        #[serde(default)]
        class: TokenClass,
        ixti: u16,
        area: AreaRef,
    },
    Attr {
        #[serde(flatten)]
        attr: Attr,
    },
    /// `PtgMem*`: the sub-expression that follows ends right before token `end`.
    Mem {
        #[serde(default)]
        class: TokenClass,
        #[serde(flatten)]
        op: MemOp,
        end: usize,
    },
}

impl Token {
    /// Class-independent kind used by the context legality table.
    pub fn kind(&self) -> PtgKind {
        match self {
            Token::SharedFormula { .. } => PtgKind::Exp,
            Token::Table { .. } => PtgKind::Tbl,
            Token::Binary { op } => op.kind(),
            Token::Unary { .. } => PtgKind::Unary,
            Token::Paren => PtgKind::Paren,
            Token::MissingArg => PtgKind::MissArg,
            Token::Str { .. } => PtgKind::Str,
            Token::Error { .. } => PtgKind::Err,
            Token::Bool { .. } => PtgKind::Bool,
            Token::Int { .. } => PtgKind::Int,
            Token::Number { .. } => PtgKind::Num,
            Token::Array { .. } => PtgKind::Array,
            Token::Func { .. } => PtgKind::Func,
            Token::FuncVar { .. } => PtgKind::FuncVar,
            Token::Name { .. } => PtgKind::Name,
            Token::NameX { .. } => PtgKind::NameX,
            Token::Ref { .. } => PtgKind::Ref,
            Token::Area { .. } => PtgKind::Area,
            Token::RefErr { .. } => PtgKind::RefErr,
            Token::AreaErr { .. } => PtgKind::AreaErr,
            Token::RefN { .. } => PtgKind::RefN,
            Token::AreaN { .. } => PtgKind::AreaN,
            Token::Ref3d { .. } => PtgKind::Ref3d,
            Token::Area3d { .. } => PtgKind::Area3d,
            Token::RefErr3d { .. } => PtgKind::RefErr3d,
            Token::AreaErr3d { .. } => PtgKind::AreaErr3d,
            Token::Attr { .. } => PtgKind::Attr,
            Token::Mem { op, .. } => match op {
                MemOp::Area { .. } => PtgKind::MemArea,
                MemOp::Err => PtgKind::MemErr,
                MemOp::NoMem => PtgKind::MemNoMem,
                MemOp::Func => PtgKind::MemFunc,
                MemOp::AreaN => PtgKind::MemAreaN,
                MemOp::NoMemN => PtgKind::MemNoMemN,
            },
        }
    }

    /// `(pops, pushes)` on the evaluation stack.
    ///
    /// `PtgMem*` markers and attributes (other than `tAttrSum`) leave the stack untouched: the
    /// sub-expression following a mem marker produces its value.
    pub(crate) fn stack_effect(&self) -> (usize, usize) {
        match self {
            Token::Binary { .. } => (2, 1),
            Token::Unary { .. } | Token::Paren => (1, 1),
            Token::Func { argc, .. } | Token::FuncVar { argc, .. } => (*argc as usize, 1),
            Token::Attr { attr: Attr::Sum } => (1, 1),
            Token::Attr { .. } | Token::Mem { .. } => (0, 0),
            _ => (0, 1),
        }
    }

    pub(crate) fn is_ignorable_marker(&self) -> bool {
        matches!(self, Token::Attr { attr } if attr.is_ignorable())
    }
}

/// Ordered, logically addressable token sequence produced by the parser.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn cursor(&self) -> TokenCursor<'_> {
        TokenCursor {
            tokens: &self.tokens,
            position: 0,
        }
    }
}

impl From<Vec<Token>> for TokenStream {
    fn from(tokens: Vec<Token>) -> Self {
        Self::new(tokens)
    }
}

impl FromIterator<Token> for TokenStream {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Read cursor over a [`TokenStream`].
#[derive(Clone, Debug)]
pub struct TokenCursor<'a> {
    tokens: &'a [Token],
    position: usize,
}

impl<'a> TokenCursor<'a> {
    /// Logical index of the next token to be read.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn seek(&mut self, position: usize) {
        self.position = position.min(self.tokens.len());
    }

    /// Consume and discard the next token. Returns `false` at the end of the stream.
    pub fn flush(&mut self) -> bool {
        if self.position < self.tokens.len() {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Step back one token, returning it.
    pub fn prev(&mut self) -> Option<&'a Token> {
        let position = self.position.checked_sub(1)?;
        self.position = position;
        self.tokens.get(position)
    }

    /// The token right before the cursor, without moving.
    pub fn peek_prev(&self) -> Option<&'a Token> {
        self.position
            .checked_sub(1)
            .and_then(|position| self.tokens.get(position))
    }
}

impl<'a> Iterator for TokenCursor<'a> {
    type Item = &'a Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }
}
