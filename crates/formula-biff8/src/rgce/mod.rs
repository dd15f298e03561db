//! Token stream -> BIFF8 `rgce` encoder.
//!
//! Encoding runs in three passes:
//!
//! 1. [`emit`] writes every token (or the `#REF!` sentinel for tokens the context rejects),
//!    records each token's byte offset and leaves zero placeholders for jump fields.
//! 2. [`future_functions`] splices a `PtgName` operand in front of each future-function call.
//! 3. [`relocate`] turns the logical jump targets into byte distances.
//!
//! Array constants and `PtgMemArea` area lists are collected in a separate `rgcb` buffer that
//! follows the main token stream.

mod emit;
mod future_functions;
mod relocate;

use crate::context::FormulaContext;
use crate::error::EncodeRgceError;
use crate::names::NameTable;
use crate::token::TokenStream;

/// Output of [`encode_rgce`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncodedRgce {
    bytes: Vec<u8>,
    cce: usize,
    token_offsets: Vec<usize>,
}

impl EncodedRgce {
    /// `rgce` followed by `rgcb`, as stored in a `FORMULA`/`NAME` record.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Length of the main token stream in bytes.
    pub fn cce(&self) -> usize {
        self.cce
    }

    pub fn rgce(&self) -> &[u8] {
        &self.bytes[..self.cce]
    }

    /// Trailing data referenced by `PtgArray` and `PtgMemArea` tokens.
    pub fn rgcb(&self) -> &[u8] {
        &self.bytes[self.cce..]
    }

    /// Final byte offset of each input token within [`Self::rgce`], plus one trailing entry equal
    /// to [`Self::cce`].
    pub fn token_offsets(&self) -> &[usize] {
        &self.token_offsets
    }
}

/// Encode `tokens` for a formula of kind `context`.
///
/// `names` resolves the add-in placeholder names used by future-function calls. Tokens that
/// `context` does not accept are written as `PtgErr #REF!`; range and shape violations abort the
/// encode with an error that names the offending token.
///
/// # Example
///
/// ```
/// use formula_biff8::{encode_rgce, DefinedNames, FormulaContext, Token, TokenStream};
///
/// let tokens = TokenStream::new(vec![Token::Number { value: 3.14 }]);
/// let encoded = encode_rgce(&DefinedNames::new(), &tokens, FormulaContext::Normal).unwrap();
///
/// assert_eq!(encoded.cce(), 9);
/// assert_eq!(encoded.rgce()[0], 0x1F);
/// assert_eq!(&encoded.rgce()[1..], &3.14f64.to_le_bytes());
/// assert!(encoded.rgcb().is_empty());
/// ```
pub fn encode_rgce<N: NameTable + ?Sized>(
    names: &N,
    tokens: &TokenStream,
    context: FormulaContext,
) -> Result<EncodedRgce, EncodeRgceError> {
    let mut out = emit::emit(tokens, context)?;
    if !out.future_sites.is_empty() {
        future_functions::splice_names(&mut out, tokens, names)?;
    }
    relocate::relocate(&mut out)?;

    let cce = out.cce();
    let mut bytes = out.rgce;
    bytes.extend_from_slice(&out.rgcb);
    Ok(EncodedRgce {
        bytes,
        cce,
        token_offsets: out.offsets,
    })
}
