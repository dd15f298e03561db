use thiserror::Error;

/// Which dimension of an array literal was out of range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayDimension {
    Rows,
    Columns,
}

impl std::fmt::Display for ArrayDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArrayDimension::Rows => f.write_str("row"),
            ArrayDimension::Columns => f.write_str("column"),
        }
    }
}

/// Structured `rgce` encode failure.
///
/// Every variant aborts the whole encode; no partial buffer is returned. `index` fields are the
/// logical token index that failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeRgceError {
    #[error("row {row} out of range at token {index} (max {max})")]
    RowOutOfRange { index: usize, row: i64, max: i64 },
    #[error("column {col} out of range at token {index} (max {max})")]
    ColumnOutOfRange { index: usize, col: i64, max: i64 },
    #[error("array literal {dimension} count {count} out of range at token {index} (max {max})")]
    ArrayDimensionOutOfRange {
        index: usize,
        dimension: ArrayDimension,
        count: usize,
        max: usize,
    },
    #[error("string literal of {len} characters at token {index} exceeds the maximum of {max}")]
    StringTooLong { index: usize, len: usize, max: usize },
    #[error("future function `{name}` at token {index} has no add-in name in the name table")]
    FutureFunctionNameNotFound { index: usize, name: String },
    #[error("invalid token at index {index}: {reason}")]
    InvalidToken { index: usize, reason: &'static str },
    #[error("jump target {target} of token {index} is past the end of the formula ({len} tokens)")]
    JumpTargetOutOfRange {
        index: usize,
        target: usize,
        len: usize,
    },
    #[error("jump offset {offset} of token {index} does not fit in 16 bits")]
    JumpOffsetOverflow { index: usize, offset: i64 },
}

impl EncodeRgceError {
    /// Logical index of the token that caused the failure.
    pub fn token_index(&self) -> usize {
        match *self {
            EncodeRgceError::RowOutOfRange { index, .. } => index,
            EncodeRgceError::ColumnOutOfRange { index, .. } => index,
            EncodeRgceError::ArrayDimensionOutOfRange { index, .. } => index,
            EncodeRgceError::StringTooLong { index, .. } => index,
            EncodeRgceError::FutureFunctionNameNotFound { index, .. } => index,
            EncodeRgceError::InvalidToken { index, .. } => index,
            EncodeRgceError::JumpTargetOutOfRange { index, .. } => index,
            EncodeRgceError::JumpOffsetOverflow { index, .. } => index,
        }
    }
}

/// Codec-level failure without a token position; the encoder attaches the index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("row {row} out of range (max {max})")]
    Row { row: i64, max: i64 },
    #[error("column {col} out of range (max {max})")]
    Column { col: i64, max: i64 },
    #[error("array literal {dimension} count {count} out of range (max {max})")]
    ArrayDimension {
        dimension: ArrayDimension,
        count: usize,
        max: usize,
    },
    #[error("string of {len} characters exceeds the maximum of {max}")]
    StringTooLong { len: usize, max: usize },
    #[error("array literal rows have different lengths")]
    Ragged,
}

impl CodecError {
    pub(crate) fn at(self, index: usize) -> EncodeRgceError {
        match self {
            CodecError::Row { row, max } => EncodeRgceError::RowOutOfRange { index, row, max },
            CodecError::Column { col, max } => {
                EncodeRgceError::ColumnOutOfRange { index, col, max }
            }
            CodecError::ArrayDimension {
                dimension,
                count,
                max,
            } => EncodeRgceError::ArrayDimensionOutOfRange {
                index,
                dimension,
                count,
                max,
            },
            CodecError::StringTooLong { len, max } => {
                EncodeRgceError::StringTooLong { index, len, max }
            }
            CodecError::Ragged => EncodeRgceError::InvalidToken {
                index,
                reason: "array literal rows have different lengths",
            },
        }
    }
}
