#![allow(dead_code)]

use formula_biff8::{encode_rgce, DefinedNames, EncodedRgce, FormulaContext, Token, TokenStream};

pub fn u16_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

/// Byte length of the BIFF8 token starting at `rgce[offset]`.
///
/// Only covers the token shapes the encoder produces (e.g. `PtgStr` never carries rich-text or
/// phonetic blocks).
pub fn ptg_len(rgce: &[u8], offset: usize) -> usize {
    let ptg = rgce[offset];
    match ptg {
        0x01 | 0x02 => 5,
        0x03..=0x16 => 1,
        0x17 => {
            let cch = rgce[offset + 1] as usize;
            let wide = rgce[offset + 2] & 0x01 != 0;
            3 + cch * if wide { 2 } else { 1 }
        }
        0x19 => match rgce[offset + 1] {
            0x04 => 4 + 2 * (u16_at(rgce, offset + 2) as usize + 1),
            _ => 4,
        },
        0x1C | 0x1D => 2,
        0x1E => 3,
        0x1F => 9,
        0x20..=0x7F => match (ptg & 0x1F) | 0x20 {
            0x20 => 8,
            0x21 => 3,
            0x22 => 4,
            0x23 => 5,
            0x24 | 0x2A | 0x2C => 5,
            0x25 | 0x2B | 0x2D => 9,
            0x26 | 0x27 => 7,
            0x28 | 0x29 | 0x2E | 0x2F => 3,
            0x39 | 0x3A | 0x3C => 7,
            0x3B | 0x3D => 11,
            other => panic!("unexpected classed ptg 0x{other:02X} at offset {offset}"),
        },
        other => panic!("unexpected ptg 0x{other:02X} at offset {offset}"),
    }
}

/// Start offset of every token in `rgce`, plus a trailing entry equal to `rgce.len()`.
pub fn token_starts(rgce: &[u8]) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut offset = 0;
    while offset < rgce.len() {
        starts.push(offset);
        offset += ptg_len(rgce, offset);
    }
    assert_eq!(offset, rgce.len(), "token walk overran the rgce");
    starts.push(offset);
    starts
}

pub fn encode(tokens: Vec<Token>) -> EncodedRgce {
    encode_in(tokens, FormulaContext::Normal)
}

pub fn encode_in(tokens: Vec<Token>, context: FormulaContext) -> EncodedRgce {
    encode_rgce(&DefinedNames::new(), &TokenStream::new(tokens), context).expect("encode rgce")
}
