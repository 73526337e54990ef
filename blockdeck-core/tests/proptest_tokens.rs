//! Property-based tests for field tokens and classification
//!
//! Tokens are embedded in arbitrary filler text and must come back in order,
//! both from plain text and after a compose round trip.

use blockdeck::extract::tokens::extract;
use blockdeck::{
    classify, extract_blocks, BlockComposer, BlockType, Bounds, Element, Presentation, TextBody,
};
use proptest::prelude::*;

// Identifiers as found in real blocks
fn ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}"
}

// Filler that cannot open or close a token
fn filler() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ,:;!?-]{0,12}"
}

prop_compose! {
    fn token_text()(
        pairs in prop::collection::vec((ident(), ident()), 0..6),
        fillers in prop::collection::vec(filler(), 7)
    ) -> (String, Vec<(String, String)>) {
        let mut text = fillers[0].clone();
        for (i, (label, name)) in pairs.iter().enumerate() {
            text.push_str(&format!("{{{{{label}.{name}}}}}"));
            text.push_str(&fillers[i + 1]);
        }
        (text, pairs)
    }
}

proptest! {
    #[test]
    fn test_tokens_found_in_order((text, pairs) in token_text()) {
        let tokens = extract(&text);
        prop_assert_eq!(tokens.len(), pairs.len());
        for (token, (label, name)) in tokens.iter().zip(&pairs) {
            prop_assert_eq!(&token.label, label);
            prop_assert_eq!(&token.name, name);
            prop_assert_eq!(token.raw_text.clone(), format!("{{{{{label}.{name}}}}}"));
            prop_assert!(token.raw_text.starts_with("{{") && token.raw_text.ends_with("}}"));
        }
    }

    #[test]
    fn test_text_without_braces_has_no_tokens(text in "[^{}]{0,80}") {
        prop_assert!(extract(&text).is_empty());
    }

    #[test]
    fn test_padded_components_are_trimmed(
        label in ident(),
        name in ident(),
        pad in " {0,3}"
    ) {
        let text = format!("{{{{{pad}{label}{pad}.{pad}{name}{pad}}}}}");
        let tokens = extract(&text);
        prop_assert_eq!(tokens.len(), 1);
        prop_assert_eq!(&tokens[0].label, &label);
        prop_assert_eq!(&tokens[0].name, &name);
        prop_assert_eq!(&tokens[0].raw_text, &text);
    }

    #[test]
    fn test_text_boxes_classify_as_text_or_list(text in "[ -~\n•]{0,60}") {
        let element = Element::text_box(Bounds::new(0, 0, 100, 100), TextBody::from_text(&text));
        let block_type = classify(&element);
        prop_assert!(matches!(block_type, BlockType::Text | BlockType::List));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_compose_round_trip_keeps_tokens(
        texts in prop::collection::vec(token_text(), 1..4)
    ) {
        let mut block = Presentation::with_blank_slide().unwrap();
        for (i, (text, _)) in texts.iter().enumerate() {
            block.slide_mut(0).unwrap().insert_element(Element::text_box(
                Bounds::from_inches(1.0, 1.0 + i as f64, 8.0, 0.8),
                TextBody::from_text(text),
            ));
        }
        let block_bytes = block.save().unwrap();

        let mut deck = Presentation::with_blank_slide().unwrap();
        BlockComposer::new().compose(&mut deck, &block_bytes, 0).unwrap();
        let deck = Presentation::open(&deck.save().unwrap()).unwrap();

        let keys = |p: &Presentation| -> Vec<(String, String)> {
            extract_blocks(p)
                .into_iter()
                .flat_map(|d| d.tokens.into_iter().map(|t| (t.label, t.name)))
                .collect()
        };
        let expected: Vec<(String, String)> = texts.into_iter().flat_map(|(_, pairs)| pairs).collect();
        prop_assert_eq!(keys(&Presentation::open(&block_bytes).unwrap()), expected.clone());
        prop_assert_eq!(keys(&deck), expected);
    }
}
