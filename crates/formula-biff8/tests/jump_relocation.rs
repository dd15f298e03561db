use formula_biff8::{
    encode_rgce, AreaBounds, Attr, BinaryOp, CellRef, DefinedNames, EncodeRgceError,
    FormulaContext, FunctionId, MemOp, Token, TokenClass, TokenStream,
};
use pretty_assertions::assert_eq;

mod common;

use common::{encode, token_starts, u16_at};

fn encode_err(tokens: Vec<Token>) -> EncodeRgceError {
    encode_rgce(&DefinedNames::new(), &TokenStream::new(tokens), FormulaContext::Normal)
        .expect_err("expected encode error")
}

fn builtin(argc: u8, iftab: u16) -> Token {
    Token::FuncVar {
        class: TokenClass::Value,
        argc,
        function: FunctionId::Builtin(iftab),
    }
}

#[test]
fn if_and_goto_distances() {
    // =IF((A1=1), 1.5+2.5, 0)
    let tokens = vec![
        Token::Ref {
            class: TokenClass::Value,
            cell: CellRef::relative(0, 0),
        },
        Token::Int { value: 1 },
        Token::Binary { op: BinaryOp::Eq },
        Token::Paren,
        Token::Attr {
            attr: Attr::If { target: 9 },
        },
        Token::Number { value: 1.5 },
        Token::Number { value: 2.5 },
        Token::Binary { op: BinaryOp::Add },
        Token::Attr {
            attr: Attr::Goto { target: 12 },
        },
        Token::Int { value: 0 },
        Token::Attr {
            attr: Attr::Goto { target: 12 },
        },
        builtin(3, 1),
    ];
    let encoded = encode(tokens);
    let rgce = encoded.rgce();

    assert_eq!(
        encoded.token_offsets(),
        &[0, 5, 8, 9, 10, 14, 23, 32, 33, 37, 40, 44, 48]
    );
    assert_eq!(&rgce[10..12], &[0x19, 0x02]);
    // tAttrIf field at 12 jumps to the false branch at 37.
    assert_eq!(u16_at(rgce, 12), 23);
    // Both gotos land one byte short of the end of the IF call.
    assert_eq!(u16_at(rgce, 35), 10);
    assert_eq!(u16_at(rgce, 42), 3);
    assert_eq!(token_starts(rgce), encoded.token_offsets());
}

#[test]
fn choose_table_entries_are_relative_to_each_entry() {
    // =CHOOSE(2, 10, 20)
    let tokens = vec![
        Token::Int { value: 2 },
        Token::Attr {
            attr: Attr::Choose {
                targets: vec![2, 4, 6],
            },
        },
        Token::Int { value: 10 },
        Token::Attr {
            attr: Attr::Goto { target: 7 },
        },
        Token::Int { value: 20 },
        Token::Attr {
            attr: Attr::Goto { target: 7 },
        },
        builtin(3, 100),
    ];
    let encoded = encode(tokens);
    let rgce = encoded.rgce();

    assert_eq!(encoded.token_offsets(), &[0, 3, 13, 16, 20, 23, 27, 31]);
    assert_eq!(&rgce[3..7], &[0x19, 0x04, 0x02, 0x00]);
    assert_eq!(
        [u16_at(rgce, 7), u16_at(rgce, 9), u16_at(rgce, 11)],
        [6, 11, 16]
    );
    assert_eq!(u16_at(rgce, 18), 10);
    assert_eq!(u16_at(rgce, 25), 3);
    assert_eq!(token_starts(rgce), encoded.token_offsets());
}

#[test]
fn mem_func_cce_covers_its_sub_expression() {
    let tokens = vec![
        Token::Mem {
            class: TokenClass::Reference,
            op: MemOp::Func,
            end: 4,
        },
        Token::Ref3d {
            class: TokenClass::Reference,
            ixti: 0,
            cell: CellRef::absolute(0, 0),
        },
        Token::Ref3d {
            class: TokenClass::Reference,
            ixti: 1,
            cell: CellRef::absolute(0, 0),
        },
        Token::Binary {
            op: BinaryOp::Union,
        },
        Token::Paren,
    ];
    let encoded = encode(tokens);
    let rgce = encoded.rgce();
    assert_eq!(rgce[0], 0x29);
    assert_eq!(u16_at(rgce, 1), 15);
    assert_eq!(encoded.token_offsets(), &[0, 3, 10, 17, 18, 19]);
}

#[test]
fn mem_area_keeps_reserved_bytes_and_writes_area_list() {
    let tokens = vec![
        Token::Mem {
            class: TokenClass::Value,
            op: MemOp::Area {
                areas: vec![AreaBounds {
                    first_row: 0,
                    last_row: 9,
                    first_col: 0,
                    last_col: 0,
                }],
            },
            end: 2,
        },
        Token::Ref3d {
            class: TokenClass::Reference,
            ixti: 0,
            cell: CellRef::absolute(0, 0),
        },
    ];
    let encoded = encode(tokens);
    assert_eq!(
        encoded.rgce(),
        &[0x46, 0, 0, 0, 0, 0x07, 0x00, 0x3A, 0, 0, 0, 0, 0, 0]
    );
    assert_eq!(
        encoded.rgcb(),
        &[0x01, 0x00, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
}

#[test]
fn target_past_the_end_is_rejected() {
    let err = encode_err(vec![
        Token::Bool { value: true },
        Token::Attr {
            attr: Attr::If { target: 4 },
        },
        Token::Int { value: 1 },
    ]);
    assert_eq!(
        err,
        EncodeRgceError::JumpTargetOutOfRange {
            index: 1,
            target: 4,
            len: 3
        }
    );
}

#[test]
fn target_equal_to_length_means_end_of_formula() {
    let encoded = encode(vec![
        Token::Bool { value: true },
        Token::Attr {
            attr: Attr::If { target: 3 },
        },
        Token::Int { value: 1 },
    ]);
    assert_eq!(u16_at(encoded.rgce(), 4), 3);
}

#[test]
fn backward_jump_is_an_overflow() {
    let err = encode_err(vec![
        Token::Bool { value: true },
        Token::Attr {
            attr: Attr::If { target: 0 },
        },
    ]);
    assert_eq!(
        err,
        EncodeRgceError::JumpOffsetOverflow {
            index: 1,
            offset: -6
        }
    );
}

#[test]
fn jump_longer_than_u16_is_an_overflow() {
    let mut tokens = vec![Token::Attr {
        attr: Attr::If { target: 7301 },
    }];
    tokens.extend(std::iter::repeat(Token::Number { value: 0.0 }).take(7300));
    let err = encode_err(tokens);
    assert_eq!(
        err,
        EncodeRgceError::JumpOffsetOverflow {
            index: 0,
            offset: 65_700
        }
    );
}

#[test]
fn choose_needs_at_least_one_target() {
    let err = encode_err(vec![
        Token::Int { value: 1 },
        Token::Attr {
            attr: Attr::Choose { targets: vec![] },
        },
    ]);
    assert!(
        matches!(err, EncodeRgceError::InvalidToken { index: 1, .. }),
        "unexpected error: {err:?}"
    );
}
