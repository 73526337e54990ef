//! Property-based tests for automatic text layout
//!
//! Checks the stacking and shrinking laws over arbitrary field sets on the
//! default 10" x 7.5" canvas.

use blockdeck::layout::{try_layout, FieldPlacement, FieldStyle, LayoutOptions};
use blockdeck::{Element, Presentation};
use proptest::prelude::*;

const CANVAS_HEIGHT: f64 = 7.5;

prop_compose! {
    fn field_strategy()(
        text in prop_oneof![
            3 => "[a-z]{1}[a-z ]{0,400}",
            1 => " {0,4}",
        ],
        order in -3i64..4,
        size in 8u32..48
    ) -> FieldPlacement {
        FieldPlacement::new(text, order).with_style(FieldStyle {
            size: Some(f64::from(size).into()),
            ..FieldStyle::default()
        })
    }
}

fn run_sizes(deck: &Presentation, ids: &[u32]) -> Vec<Vec<f64>> {
    let elements = deck.slide(0).unwrap().elements();
    ids.iter()
        .map(|id| {
            let element = elements.iter().find(|e| e.id == *id).unwrap();
            element
                .text_body()
                .unwrap()
                .paragraphs
                .iter()
                .flat_map(|p| p.runs.iter().filter_map(|r| r.props.size))
                .collect()
        })
        .collect()
}

fn original_sizes(fields: &[FieldPlacement]) -> Vec<f64> {
    let mut kept: Vec<&FieldPlacement> = fields.iter().filter(|f| !f.is_blank()).collect();
    kept.sort_by_key(|f| f.order_index);
    kept.iter()
        .map(|f| match &f.style.size {
            Some(blockdeck::layout::SizeValue::Points(points)) => *points,
            _ => 18.0,
        })
        .collect()
}

proptest! {
    #[test]
    fn test_blank_fields_are_excluded(fields in prop::collection::vec(field_strategy(), 0..8)) {
        let mut deck = Presentation::with_blank_slide().unwrap();
        let result = try_layout(&mut deck.canvas_mut(0).unwrap(), &fields).unwrap();
        let expected = fields.iter().filter(|f| !f.is_blank()).count();
        prop_assert_eq!(result.created.len(), expected);
        prop_assert_eq!(deck.slide(0).unwrap().elements().len(), expected);
    }

    #[test]
    fn test_layout_twice_keeps_count(fields in prop::collection::vec(field_strategy(), 0..8)) {
        let mut deck = Presentation::with_blank_slide().unwrap();
        try_layout(&mut deck.canvas_mut(0).unwrap(), &fields).unwrap();
        let first = deck.slide(0).unwrap().elements().len();
        let second = try_layout(&mut deck.canvas_mut(0).unwrap(), &fields).unwrap();
        prop_assert_eq!(second.removed, first);
        prop_assert_eq!(deck.slide(0).unwrap().elements().len(), first);
    }

    #[test]
    fn test_sizes_follow_shrink_law(fields in prop::collection::vec(field_strategy(), 1..8)) {
        let mut deck = Presentation::with_blank_slide().unwrap();
        let result = try_layout(&mut deck.canvas_mut(0).unwrap(), &fields).unwrap();
        let originals = original_sizes(&fields);
        let actual = run_sizes(&deck, &result.created);
        prop_assert_eq!(actual.len(), originals.len());

        match result.shrink_factor {
            Some(factor) => {
                prop_assert!(result.total_height > CANVAS_HEIGHT);
                prop_assert_eq!(factor, CANVAS_HEIGHT / result.total_height);
                for (runs, original) in actual.iter().zip(&originals) {
                    let expected = (original * factor).floor().max(8.0);
                    prop_assert!(runs.iter().all(|size| *size == expected));
                }
            }
            None => {
                prop_assert!(result.total_height <= CANVAS_HEIGHT);
                for (runs, original) in actual.iter().zip(&originals) {
                    prop_assert!(runs.iter().all(|size| size == original));
                }
            }
        }
    }

    #[test]
    fn test_boxes_stack_without_overlap(fields in prop::collection::vec(field_strategy(), 1..8)) {
        let mut deck = Presentation::with_blank_slide().unwrap();
        let result = try_layout(&mut deck.canvas_mut(0).unwrap(), &fields).unwrap();
        let elements = deck.slide(0).unwrap().elements();
        let boxes: Vec<&Element> = result
            .created
            .iter()
            .filter_map(|id| elements.iter().find(|e| e.id == *id))
            .collect();
        let margin = blockdeck::geometry::inches_to_emu(LayoutOptions::default().margin_left);
        for pair in boxes.windows(2) {
            prop_assert!(pair[0].bounds.top + pair[0].bounds.height <= pair[1].bounds.top);
        }
        for element in &boxes {
            prop_assert_eq!(element.bounds.left, margin);
        }
    }
}
