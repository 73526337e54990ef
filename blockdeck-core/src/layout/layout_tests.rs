use super::*;
use crate::document::Presentation;
use crate::geometry::{emu_to_inches, inches_to_emu};
use crate::model::{Alignment, ColorValue, ElementKind, Rgb, Run};
use pretty_assertions::assert_eq;

fn field(text: &str, order: i64) -> FieldPlacement {
    FieldPlacement::new(text, order)
}

fn sized(text: &str, order: i64, size: f64) -> FieldPlacement {
    field(text, order).with_style(FieldStyle {
        size: Some(size.into()),
        ..FieldStyle::default()
    })
}

fn run_sizes(canvas: &Canvas<'_>, ids: &[u32]) -> Vec<f64> {
    ids.iter()
        .filter_map(|id| canvas.elements().iter().find(|e| e.id == *id))
        .map(|e| e.text_body().unwrap().paragraphs[0].runs[0].props.size.unwrap())
        .collect()
}

#[test]
fn test_single_field_fits_without_shrink() {
    let mut deck = Presentation::with_blank_slide().unwrap();
    let mut canvas = deck.canvas_mut(0).unwrap();
    let text = "x".repeat(120);

    let result = try_layout(&mut canvas, &[field(&text, 0)]).unwrap();

    let expected = (120.0 / 53.0) * ((18.0 / 72.0) * 1.2);
    assert_eq!(result.created.len(), 1);
    assert!(result.shrink_factor.is_none());
    assert!((result.total_height - (1.0 + expected + 0.3)).abs() < 1e-9);

    let element = &canvas.elements()[0];
    assert_eq!(element.kind(), ElementKind::Text);
    assert_eq!(element.bounds.left, inches_to_emu(1.0));
    assert_eq!(element.bounds.top, inches_to_emu(1.0));
    assert_eq!(element.bounds.width, inches_to_emu(8.0));
    assert_eq!(element.bounds.height, inches_to_emu(expected));
    assert_eq!(run_sizes(&canvas, &result.created), vec![18.0]);
}

#[test]
fn test_estimate_height_formula() {
    let options = LayoutOptions::default();
    // floor(8 / 0.15) = 53 chars per line
    let height = options.estimate_height(&"a".repeat(106), 18.0, 8.0);
    assert!((height - 2.0 * 0.3).abs() < 1e-9);
    // a single short line still counts as one line
    let short = options.estimate_height("hi", 18.0, 8.0);
    assert!((short - 0.3).abs() < 1e-9);
    // narrower than one character
    let narrow = options.estimate_height("abc", 72.0, 0.1);
    assert!((narrow - 3.0 * 1.2).abs() < 1e-9);
}

#[test]
fn test_fields_stack_with_spacing() {
    let mut deck = Presentation::with_blank_slide().unwrap();
    let mut canvas = deck.canvas_mut(0).unwrap();
    let result = try_layout(&mut canvas, &[field("first", 0), field("second", 1)]).unwrap();

    let tops: Vec<f64> = canvas
        .elements()
        .iter()
        .map(|e| emu_to_inches(e.bounds.top))
        .collect();
    assert!((tops[0] - 1.0).abs() < 1e-6);
    assert!((tops[1] - (1.0 + 0.3 + 0.3)).abs() < 1e-6);
    assert!((result.total_height - 2.2).abs() < 1e-9);
}

#[test]
fn test_overflow_shrinks_uniformly() {
    let mut deck = Presentation::with_blank_slide().unwrap();
    let mut canvas = deck.canvas_mut(0).unwrap();
    let options = LayoutOptions {
        margin_top: 0.0,
        field_spacing: 0.0,
        ..LayoutOptions::default()
    };
    // 530 chars at 18pt is ten lines of 0.3": three of them stack to 9"
    let long = "y".repeat(530);
    let fields = [sized(&long, 0, 18.0), sized(&long, 1, 18.0), sized(&long, 2, 18.0)];

    let result = TextLayout::with_options(options)
        .try_layout(&mut canvas, &fields)
        .unwrap();

    assert!((result.total_height - 9.0).abs() < 1e-9);
    let factor = result.shrink_factor.unwrap();
    assert!((factor - 7.5 / 9.0).abs() < 1e-9);
    let shrunk = (18.0 * factor).floor().max(8.0);
    assert_eq!(run_sizes(&canvas, &result.created), vec![shrunk; 3]);
}

#[test]
fn test_overflow_law_with_floor() {
    let mut deck = Presentation::with_blank_slide().unwrap();
    let mut canvas = deck.canvas_mut(0).unwrap();
    let long = "z".repeat(900);
    let fields = [
        sized(&long, 0, 40.0),
        sized(&long, 1, 9.0),
        sized("short", 2, 24.0),
    ];
    let result = try_layout(&mut canvas, &fields).unwrap();

    let factor = 7.5 / result.total_height;
    assert!(result.total_height > 7.5);
    assert_eq!(result.shrink_factor, Some(factor));
    let expected: Vec<f64> = [40.0, 9.0, 24.0]
        .iter()
        .map(|size: &f64| (size * factor).floor().max(8.0))
        .collect();
    assert_eq!(run_sizes(&canvas, &result.created), expected);
    // the 9pt field is clamped to the minimum
    assert_eq!(expected[1], 8.0);
}

#[test]
fn test_blank_fields_excluded() {
    let mut deck = Presentation::with_blank_slide().unwrap();
    let mut canvas = deck.canvas_mut(0).unwrap();
    let result = try_layout(
        &mut canvas,
        &[field("kept", 0), field("", 1), field("  \n\t", 2)],
    )
    .unwrap();
    assert_eq!(result.created.len(), 1);
    assert_eq!(canvas.elements().len(), 1);
}

#[test]
fn test_sorted_by_order_index_stable() {
    let mut deck = Presentation::with_blank_slide().unwrap();
    let mut canvas = deck.canvas_mut(0).unwrap();
    try_layout(
        &mut canvas,
        &[field("c", 2), field("a1", 0), field("b", 1), field("a2", 0)],
    )
    .unwrap();
    let texts: Vec<String> = canvas.elements().iter().filter_map(|e| e.text()).collect();
    assert_eq!(texts, vec!["a1", "a2", "b", "c"]);
}

#[test]
fn test_layout_twice_is_idempotent() {
    let mut deck = Presentation::with_blank_slide().unwrap();
    let fields = [field("Title", 0), field("Body text", 1)];

    let mut canvas = deck.canvas_mut(0).unwrap();
    assert!(layout(&mut canvas, &fields));
    let first = canvas.elements().len();
    assert!(layout(&mut canvas, &fields));
    assert_eq!(canvas.elements().len(), first);
    assert_eq!(first, 2);
}

#[test]
fn test_cleanup_keeps_pictures_and_titles() {
    let mut deck = Presentation::with_blank_slide().unwrap();
    {
        let slide = deck.slide_mut(0).unwrap();
        slide.insert_element(Element::picture(Bounds::from_inches(0.0, 0.0, 1.0, 1.0), "rId9"));
        slide.insert_element(Element::text_box(
            Bounds::from_inches(1.0, 1.0, 4.0, 1.0),
            TextBody::from_text("{{title.main}}"),
        ));
    }
    let mut canvas = deck.canvas_mut(0).unwrap();
    let result = try_layout(&mut canvas, &[field("Quarterly report", 0)]).unwrap();
    assert_eq!(result.removed, 1);
    let kinds: Vec<_> = canvas.elements().iter().map(Element::kind).collect();
    assert_eq!(kinds, vec![ElementKind::Image, ElementKind::Text]);
}

#[test]
fn test_style_applied_to_every_line() {
    let mut deck = Presentation::with_blank_slide().unwrap();
    let mut canvas = deck.canvas_mut(0).unwrap();
    let style = FieldStyle {
        name: Some("Georgia".to_string()),
        color: Some("#336699".to_string()),
        italic: Some(true),
        alignment: Some("RIGHT".to_string()),
        ..FieldStyle::default()
    };
    try_layout(&mut canvas, &[field("one\ntwo", 0).with_style(style)]).unwrap();

    let body = canvas.elements()[0].text_body().unwrap();
    assert_eq!(body.word_wrap, Some(true));
    assert_eq!(body.paragraphs.len(), 2);
    for paragraph in &body.paragraphs {
        assert_eq!(paragraph.alignment, Some(Alignment::Right));
        let props = &paragraph.runs[0].props;
        assert_eq!(props.font.as_deref(), Some("Georgia"));
        assert_eq!(props.size, Some(18.0));
        assert_eq!(props.italic, Some(true));
        assert_eq!(props.bold, Some(false));
        assert_eq!(props.color, Some(ColorValue::Rgb(Rgb::new(0x33, 0x66, 0x99))));
    }
}

#[test]
fn test_default_style_from_options() {
    let mut deck = Presentation::with_blank_slide().unwrap();
    let mut canvas = deck.canvas_mut(0).unwrap();
    let options = LayoutOptions::from_json(r#"{"defaultStyle": {"name": "Calibri", "size": 12}}"#)
        .unwrap();
    assert_eq!(options.margin_left, 1.0);
    let result = TextLayout::with_options(options)
        .try_layout(&mut canvas, &[field("plain", 0), sized("big", 1, 30.0)])
        .unwrap();
    assert_eq!(run_sizes(&canvas, &result.created), vec![12.0, 30.0]);
    let props = &canvas.elements()[0].text_body().unwrap().paragraphs[0].runs[0].props;
    assert_eq!(props.font.as_deref(), Some("Calibri"));
}

#[test]
fn test_no_width_leaves_canvas_untouched() {
    let mut deck = Presentation::with_blank_slide().unwrap();
    deck.slide_mut(0)
        .unwrap()
        .insert_element(Element::text_box(Bounds::default(), TextBody::from_text("old")));
    let mut canvas = deck.canvas_mut(0).unwrap();
    let engine = TextLayout::with_options(LayoutOptions {
        margin_left: 6.0,
        margin_right: 6.0,
        ..LayoutOptions::default()
    });

    assert_eq!(
        engine.try_layout(&mut canvas, &[field("text", 0)]),
        Err(LayoutError::NoWidth(-2.0))
    );
    assert!(!engine.layout(&mut canvas, &[field("text", 0)]));
    assert_eq!(canvas.elements().len(), 1);
}

#[test]
fn test_placement_json_accepts_both_spellings() {
    let camel: FieldPlacement = serde_json::from_str(
        r#"{"text": "Hi", "style": {"size": 20}, "orderIndex": 3, "key": "title.main"}"#,
    )
    .unwrap();
    let snake: FieldPlacement = serde_json::from_str(
        r#"{"text": "Hi", "font_metadata": {"size": 20}, "order_index": 3, "key": "title.main"}"#,
    )
    .unwrap();
    assert_eq!(camel, snake);
    assert_eq!(camel.order_index, 3);
    assert_eq!(camel.key.as_deref(), Some("title.main"));
}

#[test]
fn test_layout_survives_save() {
    let mut deck = Presentation::with_blank_slide().unwrap();
    {
        let mut canvas = deck.canvas_mut(0).unwrap();
        assert!(layout(&mut canvas, &[sized("Saved field", 0, 22.0)]));
    }
    let reopened = Presentation::open(&deck.save().unwrap()).unwrap();
    let element = &reopened.slide(0).unwrap().elements()[0];
    assert_eq!(element.text().unwrap(), "Saved field");
    let body = element.text_body().unwrap();
    assert_eq!(body.word_wrap, Some(true));
    assert_eq!(body.paragraphs[0].runs[0].props.size, Some(22.0));
}

#[test]
fn test_soft_breaks_and_control_characters_survive_save() {
    let mut deck = Presentation::with_blank_slide().unwrap();
    {
        let mut canvas = deck.canvas_mut(0).unwrap();
        let fields = [
            sized("line one\u{b}line two", 0, 20.0),
            field("crlf\r\nlines\rend", 1),
            field("bell\u{7}here", 2),
        ];
        assert!(layout(&mut canvas, &fields));
    }
    let reopened = Presentation::open(&deck.save().unwrap()).unwrap();
    let elements = reopened.slide(0).unwrap().elements();

    let soft = &elements[0].text_body().unwrap().paragraphs;
    assert_eq!(soft.len(), 1);
    let runs = &soft[0].runs;
    assert_eq!(runs.len(), 3);
    assert!(runs[1].line_break);
    assert_eq!(runs[1].props.size, Some(20.0));
    assert_eq!(elements[0].text().unwrap(), "line one\nline two");

    assert_eq!(elements[1].text_body().unwrap().paragraphs.len(), 3);
    assert_eq!(elements[1].text().unwrap(), "crlf\nlines\nend");

    assert_eq!(elements[2].text().unwrap(), "bell_x0007_here");
}

#[test]
fn test_shrink_reaches_line_breaks() {
    let mut deck = Presentation::with_blank_slide().unwrap();
    let mut canvas = deck.canvas_mut(0).unwrap();
    let long = format!("{}\u{b}{}", "x".repeat(2000), "y".repeat(2000));
    let result = try_layout(&mut canvas, &[sized(&long, 0, 40.0)]).unwrap();
    assert!(result.shrink_factor.is_some());

    let runs: &Vec<Run> = &canvas.elements()[0].text_body().unwrap().paragraphs[0].runs;
    assert!(runs[1].line_break);
    assert_eq!(runs[1].props.size, runs[0].props.size);
    assert!(runs[0].props.size.unwrap() < 40.0);
}
