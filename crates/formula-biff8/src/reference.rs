//! Cell/range reference payloads.
//!
//! BIFF8 references store a 16-bit row and a 16-bit column field. The column field keeps the
//! column index in its low bits and the relative flags in the two high bits:
//!
//! ```text
//! bit 15: column is relative
//! bit 14: row is relative
//! bits 0..=13: column (0..=255 in BIFF8)
//! ```
//!
//! `PtgRefN` / `PtgAreaN` store relative components as wrap-around offsets from the formula cell
//! (rows modulo 65536, columns modulo 256).

use crate::error::CodecError;
use crate::token::{AreaRef, CellRef};

pub(crate) const BIFF8_MAX_ROW: i64 = u16::MAX as i64; // 0..=65535
pub(crate) const BIFF8_MAX_COL: i64 = 0xFF; // 0..=255

const ROW_CEILING: i64 = BIFF8_MAX_ROW + 1;
const COL_CEILING: i64 = BIFF8_MAX_COL + 1;

const ROW_RELATIVE_BIT: u16 = 0x4000;
const COL_RELATIVE_BIT: u16 = 0x8000;

/// How the relative components of a reference are stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Addressing {
    /// Coordinates are absolute indices; relative flags only affect copy semantics.
    Absolute,
    /// Relative components are signed offsets (`PtgRefN`, `PtgAreaN`).
    Offset,
}

fn encode_row(row: i32, relative: bool, addressing: Addressing) -> Result<u16, CodecError> {
    let row = row as i64;
    if relative && addressing == Addressing::Offset {
        if row <= -ROW_CEILING || row >= ROW_CEILING {
            return Err(CodecError::Row {
                row,
                max: BIFF8_MAX_ROW,
            });
        }
        return Ok(row.rem_euclid(ROW_CEILING) as u16);
    }
    if !(0..=BIFF8_MAX_ROW).contains(&row) {
        return Err(CodecError::Row {
            row,
            max: BIFF8_MAX_ROW,
        });
    }
    Ok(row as u16)
}

fn encode_col(cell: &CellRef, addressing: Addressing) -> Result<u16, CodecError> {
    let col = cell.col as i64;
    let index = if cell.col_relative && addressing == Addressing::Offset {
        if col <= -COL_CEILING || col >= COL_CEILING {
            return Err(CodecError::Column {
                col,
                max: BIFF8_MAX_COL,
            });
        }
        col.rem_euclid(COL_CEILING) as u16
    } else {
        if !(0..=BIFF8_MAX_COL).contains(&col) {
            return Err(CodecError::Column {
                col,
                max: BIFF8_MAX_COL,
            });
        }
        col as u16
    };

    let mut field = index;
    if cell.row_relative {
        field |= ROW_RELATIVE_BIT;
    }
    if cell.col_relative {
        field |= COL_RELATIVE_BIT;
    }
    Ok(field)
}

/// `[rw: u16][col: u16]`
pub(crate) fn write_cell(
    out: &mut Vec<u8>,
    cell: &CellRef,
    addressing: Addressing,
) -> Result<(), CodecError> {
    let row = encode_row(cell.row, cell.row_relative, addressing)?;
    let col = encode_col(cell, addressing)?;
    out.extend_from_slice(&row.to_le_bytes());
    out.extend_from_slice(&col.to_le_bytes());
    Ok(())
}

/// `[rwFirst: u16][rwLast: u16][colFirst: u16][colLast: u16]`
pub(crate) fn write_area(
    out: &mut Vec<u8>,
    area: &AreaRef,
    addressing: Addressing,
) -> Result<(), CodecError> {
    let row1 = encode_row(area.first.row, area.first.row_relative, addressing)?;
    let row2 = encode_row(area.last.row, area.last.row_relative, addressing)?;
    let col1 = encode_col(&area.first, addressing)?;
    let col2 = encode_col(&area.last, addressing)?;
    out.extend_from_slice(&row1.to_le_bytes());
    out.extend_from_slice(&row2.to_le_bytes());
    out.extend_from_slice(&col1.to_le_bytes());
    out.extend_from_slice(&col2.to_le_bytes());
    Ok(())
}

/// `[ixti: u16][rw: u16][col: u16]`
pub(crate) fn write_cell_3d(
    out: &mut Vec<u8>,
    ixti: u16,
    cell: &CellRef,
) -> Result<(), CodecError> {
    let mut payload = Vec::with_capacity(4);
    write_cell(&mut payload, cell, Addressing::Absolute)?;
    out.extend_from_slice(&ixti.to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(())
}

/// `[ixti: u16][rwFirst: u16][rwLast: u16][colFirst: u16][colLast: u16]`
pub(crate) fn write_area_3d(
    out: &mut Vec<u8>,
    ixti: u16,
    area: &AreaRef,
) -> Result<(), CodecError> {
    let mut payload = Vec::with_capacity(8);
    write_area(&mut payload, area, Addressing::Absolute)?;
    out.extend_from_slice(&ixti.to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(())
}

/// Clamp a `PtgMemArea` bound into the BIFF8 grid.
pub(crate) fn clamp_row(row: u32) -> u16 {
    (row as i64).min(BIFF8_MAX_ROW) as u16
}

pub(crate) fn clamp_col(col: u32) -> u16 {
    (col as i64).min(BIFF8_MAX_COL) as u16
}
