//! Scalar literal and array-constant payloads.
//!
//! Strings are written as BIFF8 `XLUnicodeRichExtendedString` ([MS-XLS] 2.5.293/2.5.294):
//!
//! ```text
//! [cch: u8 | u16][flags: u8]
//! [cRun: u16]?      (flags & 0x08)
//! [cbExtRst: u32]?  (flags & 0x04)
//! [chars: cch bytes, or cch*2 bytes when flags & 0x01]
//! [rgRun: 4*cRun bytes]?
//! [ExtRst: cbExtRst bytes]?
//! ```
//!
//! Array constants go to the `rgcb` side buffer as `[cols-1: u8][rows-1: u16]` followed by one
//! `SerAr` value per cell in row-major order.

use crate::error::{ArrayDimension, CodecError};
use crate::token::{ArrayConstant, ArrayValue, ErrorCode};

/// Longest string constant Excel accepts in a formula.
pub(crate) const MAX_STRING_CHARS: usize = 255;
pub(crate) const MAX_ARRAY_COLS: usize = 255;
pub(crate) const MAX_ARRAY_ROWS: usize = 65_536;

const STR_FLAG_HIGH_BYTE: u8 = 0x01;
const STR_FLAG_EXT: u8 = 0x04;
const STR_FLAG_RICH_TEXT: u8 = 0x08;

// SerAr type tags.
const SER_NIL: u8 = 0x00;
const SER_NUM: u8 = 0x01;
const SER_STR: u8 = 0x02;
const SER_BOOL: u8 = 0x04;
const SER_ERR: u8 = 0x10;

/// Width of the `cch` field in front of a string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LengthPrefix {
    /// `ShortXLUnicodeString` (e.g. `PtgStr`).
    U8,
    /// `XLUnicodeString` (e.g. `SerStr` inside array constants).
    U16,
}

/// A rich-text formatting run: font `font` applies from character `first_char` on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatRun {
    pub first_char: u16,
    pub font: u16,
}

/// String payload plus the optional rich-text and far-east (phonetic) blocks.
#[derive(Clone, Copy, Debug, Default)]
pub struct BiffString<'a> {
    pub text: &'a str,
    pub runs: &'a [FormatRun],
    pub phonetic: Option<&'a [u8]>,
}

impl<'a> BiffString<'a> {
    pub fn plain(text: &'a str) -> Self {
        Self {
            text,
            runs: &[],
            phonetic: None,
        }
    }
}

/// Append `s` as an `XLUnicodeRichExtendedString` with a `prefix`-sized character count.
///
/// Characters are written compressed (one byte each) unless any UTF-16 unit is above `0xFF`.
pub fn write_biff_string(
    out: &mut Vec<u8>,
    s: &BiffString<'_>,
    prefix: LengthPrefix,
) -> Result<(), CodecError> {
    let units: Vec<u16> = s.text.encode_utf16().collect();
    if units.len() > MAX_STRING_CHARS {
        return Err(CodecError::StringTooLong {
            len: units.len(),
            max: MAX_STRING_CHARS,
        });
    }
    let wide = units.iter().any(|&u| u > 0xFF);
    let run_count = s.runs.len().min(u16::MAX as usize);

    match prefix {
        LengthPrefix::U8 => out.push(units.len() as u8),
        LengthPrefix::U16 => out.extend_from_slice(&(units.len() as u16).to_le_bytes()),
    }

    let mut flags = 0u8;
    if wide {
        flags |= STR_FLAG_HIGH_BYTE;
    }
    if run_count > 0 {
        flags |= STR_FLAG_RICH_TEXT;
    }
    if s.phonetic.is_some() {
        flags |= STR_FLAG_EXT;
    }
    out.push(flags);

    if run_count > 0 {
        out.extend_from_slice(&(run_count as u16).to_le_bytes());
    }
    if let Some(ext) = s.phonetic {
        out.extend_from_slice(&(ext.len() as u32).to_le_bytes());
    }

    out.reserve(units.len() * if wide { 2 } else { 1 });
    for unit in &units {
        if wide {
            out.extend_from_slice(&unit.to_le_bytes());
        } else {
            out.push(*unit as u8);
        }
    }

    for run in &s.runs[..run_count] {
        out.extend_from_slice(&run.first_char.to_le_bytes());
        out.extend_from_slice(&run.font.to_le_bytes());
    }
    if let Some(ext) = s.phonetic {
        out.extend_from_slice(ext);
    }
    Ok(())
}

pub(crate) fn write_number(out: &mut Vec<u8>, value: f64) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn write_bool(out: &mut Vec<u8>, value: bool) {
    out.push(value as u8);
}

pub(crate) fn write_error(out: &mut Vec<u8>, value: ErrorCode) {
    out.push(value.code());
}

/// Append an array constant to `rgcb`.
pub(crate) fn write_array(rgcb: &mut Vec<u8>, array: &ArrayConstant) -> Result<(), CodecError> {
    let cols = array.col_count();
    let rows = array.row_count();
    if cols == 0 || cols > MAX_ARRAY_COLS {
        return Err(CodecError::ArrayDimension {
            dimension: ArrayDimension::Columns,
            count: cols,
            max: MAX_ARRAY_COLS,
        });
    }
    if rows == 0 || rows > MAX_ARRAY_ROWS {
        return Err(CodecError::ArrayDimension {
            dimension: ArrayDimension::Rows,
            count: rows,
            max: MAX_ARRAY_ROWS,
        });
    }
    if array.rows.iter().any(|row| row.len() != cols) {
        return Err(CodecError::Ragged);
    }

    rgcb.push((cols - 1) as u8);
    rgcb.extend_from_slice(&((rows - 1) as u16).to_le_bytes());

    for value in array.rows.iter().flatten() {
        match value {
            ArrayValue::Empty => {
                rgcb.push(SER_NIL);
                rgcb.extend_from_slice(&[0u8; 8]);
            }
            ArrayValue::Number(n) => {
                rgcb.push(SER_NUM);
                write_number(rgcb, *n);
            }
            ArrayValue::Str(s) => {
                rgcb.push(SER_STR);
                write_biff_string(rgcb, &BiffString::plain(s), LengthPrefix::U16)?;
            }
            ArrayValue::Bool(b) => {
                rgcb.push(SER_BOOL);
                write_bool(rgcb, *b);
                rgcb.extend_from_slice(&[0u8; 7]);
            }
            ArrayValue::Error(e) => {
                rgcb.push(SER_ERR);
                write_error(rgcb, *e);
                rgcb.extend_from_slice(&[0u8; 7]);
            }
        }
    }
    Ok(())
}
