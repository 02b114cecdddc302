//! Property tests: the front end never panics and slicing stays in bounds.

use json_e_expression::{evaluate, parse_str, tokenize, Context};
use proptest::prelude::*;
use serde_json::json;

proptest! {
    #[test]
    fn tokenize_and_parse_never_panic(source in "\\PC{0,40}") {
        let _ = tokenize(&source);
        let _ = parse_str(&source);
    }

    #[test]
    fn operator_soup_never_panics(source in "[a-c0-9 ()\\[\\]{}:,.?!=<>+*/%&|'-]{0,30}") {
        let ctx = Context::from_json(json!({"a": [1, 2], "b": {"c": "x"}})).unwrap();
        let _ = evaluate(&source, &ctx);
    }

    #[test]
    fn array_slice_is_contiguous(
        items in prop::collection::vec(-100i64..100, 0..12),
        start in -15i64..15,
        end in -15i64..15,
    ) {
        let ctx = Context::from_json(json!({"xs": items})).unwrap();
        let expression = format!("xs[{}:{}]", start, end);
        let sliced = evaluate(&expression, &ctx).unwrap().to_json().unwrap();
        let sliced: Vec<i64> = serde_json::from_value(sliced).unwrap();
        prop_assert!(sliced.len() <= items.len());
        if !sliced.is_empty() {
            prop_assert!(items.windows(sliced.len()).any(|w| w == sliced.as_slice()));
        }
    }

    #[test]
    fn string_slice_respects_chars(text in "\\PC{0,12}", start in 0i64..14) {
        let ctx = Context::from_json(json!({"s": text})).unwrap();
        let head = evaluate(&format!("s[:{}]", start), &ctx).unwrap();
        let tail = evaluate(&format!("s[{}:]", start), &ctx).unwrap();
        let joined = format!(
            "{}{}",
            head.as_str().unwrap_or_default(),
            tail.as_str().unwrap_or_default()
        );
        prop_assert_eq!(joined, text);
    }
}
