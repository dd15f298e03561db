use formula_biff8::{
    encode_rgce, ArrayConstant, ArrayDimension, ArrayValue, DefinedNames, EncodeRgceError,
    ErrorCode, FormulaContext, Token, TokenClass, TokenStream,
};
use pretty_assertions::assert_eq;

mod common;

use common::encode;

fn encode_err(tokens: Vec<Token>) -> EncodeRgceError {
    encode_rgce(&DefinedNames::new(), &TokenStream::new(tokens), FormulaContext::Normal)
        .expect_err("expected encode error")
}

#[test]
fn number_literal_is_ptgnum_with_ieee_payload() {
    let encoded = encode(vec![Token::Number { value: 3.14 }]);

    let mut expected = vec![0x1F];
    expected.extend_from_slice(&3.14f64.to_le_bytes());
    assert_eq!(encoded.rgce(), expected.as_slice());
    assert_eq!(encoded.cce(), 9);
    assert_eq!(encoded.token_offsets(), &[0, 9]);
}

#[test]
fn small_scalars_have_compact_payloads() {
    let encoded = encode(vec![
        Token::Int { value: 513 },
        Token::Bool { value: true },
        Token::Error {
            value: ErrorCode::Div0,
        },
        Token::MissingArg,
    ]);
    assert_eq!(
        encoded.rgce(),
        &[0x1E, 0x01, 0x02, 0x1D, 0x01, 0x1C, 0x07, 0x16]
    );
    assert_eq!(encoded.token_offsets(), &[0, 3, 5, 7, 8]);
}

#[test]
fn string_literal_is_short_unicode_string() {
    let encoded = encode(vec![Token::Str {
        value: "abc".to_string(),
    }]);
    assert_eq!(encoded.rgce(), &[0x17, 0x03, 0x00, b'a', b'b', b'c']);
}

#[test]
fn non_latin1_string_is_written_uncompressed() {
    let encoded = encode(vec![Token::Str {
        value: "€".to_string(),
    }]);
    assert_eq!(encoded.rgce(), &[0x17, 0x01, 0x01, 0xAC, 0x20]);
}

#[test]
fn empty_string_is_allowed() {
    let encoded = encode(vec![Token::Str {
        value: String::new(),
    }]);
    assert_eq!(encoded.rgce(), &[0x17, 0x00, 0x00]);
}

#[test]
fn overlong_string_reports_token_index() {
    let err = encode_err(vec![
        Token::Int { value: 1 },
        Token::Str {
            value: "y".repeat(300),
        },
    ]);
    assert_eq!(
        err,
        EncodeRgceError::StringTooLong {
            index: 1,
            len: 300,
            max: 255
        }
    );
    assert_eq!(err.token_index(), 1);
}

#[test]
fn array_literal_goes_to_rgcb() {
    // ={1,"a";TRUE,#N/A}
    let array = ArrayConstant::new(vec![
        vec![ArrayValue::Number(1.0), ArrayValue::Str("a".to_string())],
        vec![ArrayValue::Bool(true), ArrayValue::Error(ErrorCode::NA)],
    ]);
    let encoded = encode(vec![Token::Array {
        class: TokenClass::Array,
        value: array,
    }]);

    assert_eq!(encoded.rgce(), &[0x60, 0, 0, 0, 0, 0, 0, 0]);

    let mut rgcb = vec![0x01, 0x01, 0x00];
    rgcb.push(0x01);
    rgcb.extend_from_slice(&1.0f64.to_le_bytes());
    rgcb.extend_from_slice(&[0x02, 0x01, 0x00, 0x00, b'a']);
    rgcb.extend_from_slice(&[0x04, 0x01, 0, 0, 0, 0, 0, 0, 0]);
    rgcb.extend_from_slice(&[0x10, 0x2A, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(encoded.rgcb(), rgcb.as_slice());
    assert_eq!(encoded.bytes().len(), 8 + rgcb.len());
}

#[test]
fn multiple_arrays_append_to_rgcb_in_token_order() {
    let one = ArrayConstant::new(vec![vec![ArrayValue::Bool(false)]]);
    let two = ArrayConstant::new(vec![vec![ArrayValue::Empty]]);
    let encoded = encode(vec![
        Token::Array {
            class: TokenClass::Value,
            value: one,
        },
        Token::Array {
            class: TokenClass::Value,
            value: two,
        },
        Token::Binary {
            op: formula_biff8::BinaryOp::Add,
        },
    ]);
    assert_eq!(encoded.cce(), 17);
    assert_eq!(
        encoded.rgcb(),
        &[
            0x00, 0x00, 0x00, 0x04, 0x00, 0, 0, 0, 0, 0, 0, 0, //
            0x00, 0x00, 0x00, 0x00, 0, 0, 0, 0, 0, 0, 0, 0,
        ]
    );
}

#[test]
fn array_dimension_errors_name_the_dimension() {
    let too_wide = ArrayConstant::new(vec![vec![ArrayValue::Number(0.0); 256]]);
    let err = encode_err(vec![Token::Array {
        class: TokenClass::Array,
        value: too_wide,
    }]);
    assert_eq!(
        err,
        EncodeRgceError::ArrayDimensionOutOfRange {
            index: 0,
            dimension: ArrayDimension::Columns,
            count: 256,
            max: 255,
        }
    );

    let err = encode_err(vec![Token::Array {
        class: TokenClass::Array,
        value: ArrayConstant::default(),
    }]);
    assert!(
        matches!(
            err,
            EncodeRgceError::ArrayDimensionOutOfRange {
                index: 0,
                count: 0,
                ..
            }
        ),
        "unexpected error: {err:?}"
    );
}

#[test]
fn ragged_array_is_invalid() {
    let ragged = ArrayConstant::new(vec![
        vec![ArrayValue::Number(1.0), ArrayValue::Number(2.0)],
        vec![ArrayValue::Number(3.0)],
    ]);
    let err = encode_err(vec![
        Token::Int { value: 0 },
        Token::Int { value: 0 },
        Token::Array {
            class: TokenClass::Array,
            value: ragged,
        },
    ]);
    assert!(
        matches!(err, EncodeRgceError::InvalidToken { index: 2, .. }),
        "unexpected error: {err:?}"
    );
}

#[test]
fn overlong_array_string_is_rejected() {
    let array = ArrayConstant::new(vec![vec![ArrayValue::Str("z".repeat(256))]]);
    let err = encode_err(vec![Token::Array {
        class: TokenClass::Array,
        value: array,
    }]);
    assert_eq!(
        err,
        EncodeRgceError::StringTooLong {
            index: 0,
            len: 256,
            max: 255
        }
    );
}
