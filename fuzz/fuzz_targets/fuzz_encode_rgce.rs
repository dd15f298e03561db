#![no_main]

use formula_biff8::{encode_rgce, DefinedNames, FormulaContext, TokenStream};
use libfuzzer_sys::fuzz_target;

/// Keep JSON decoding bounded; real formulas are far below this.
const MAX_INPUT_BYTES: usize = 64 * 1024;

const CONTEXTS: [FormulaContext; 5] = [
    FormulaContext::Normal,
    FormulaContext::Name,
    FormulaContext::DataValidation,
    FormulaContext::ConditionalFormat,
    FormulaContext::Chart,
];

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 || data.len() > MAX_INPUT_BYTES {
        return;
    }

    // First byte picks the context; the rest is a JSON token stream.
    let context = CONTEXTS[data[0] as usize % CONTEXTS.len()];
    let Ok(tokens) = serde_json::from_slice::<TokenStream>(&data[1..]) else {
        return;
    };

    let mut names = DefinedNames::new();
    for name in ["_xlfn.IFS", "_xlfn.CONCAT", "_xlfn.XLOOKUP", "_xlfn.SWITCH"] {
        names.push_add_in(name);
    }

    if let Ok(encoded) = encode_rgce(&names, &tokens, context) {
        let offsets = encoded.token_offsets();
        assert_eq!(offsets.len(), tokens.len() + 1);
        assert!(offsets.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(offsets.last().copied(), Some(encoded.cce()));
        assert_eq!(encoded.rgce().len() + encoded.rgcb().len(), encoded.bytes().len());
    }
});
