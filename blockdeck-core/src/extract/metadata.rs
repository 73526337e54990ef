//! Style metadata and value schemas of classified elements

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::classify::BlockType;
use crate::error::SkipReason;
use crate::geometry::Emu;
use crate::model::{Alignment, Element, ElementBody, ElementKind, TextBody};

/// Absolute element bounds in EMU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementPosition {
    pub left: Emu,
    pub top: Emu,
    pub width: Emu,
    pub height: Emu,
}

/// Font of the first run of the first paragraph.
///
/// Every member is optional: an unset member means "inherit".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FontMetadata {
    pub name: Option<String>,
    pub size: Option<f64>,
    /// `#rrggbb`, only for direct RGB colours
    pub color: Option<String>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderMetadata {
    #[serde(rename = "type")]
    pub placeholder_type: String,
    pub idx: Option<u32>,
}

/// Style record of one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleMetadata {
    pub shape_type: ElementKind,
    pub shape_name: Option<String>,
    pub position: ElementPosition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<FontMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<PlaceholderMetadata>,
    /// Best-effort sub-extractions that failed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Read the style record of `element`, classified as `block_type`.
///
/// Never fails; a missing text body on a textual element is logged and
/// recorded as unset font metadata plus a warning.
pub fn extract(element: &Element, block_type: BlockType) -> StyleMetadata {
    let mut metadata = StyleMetadata {
        shape_type: element.kind(),
        shape_name: (!element.name.is_empty()).then(|| element.name.clone()),
        position: ElementPosition {
            left: element.bounds.left,
            top: element.bounds.top,
            width: element.bounds.width,
            height: element.bounds.height,
        },
        alignment: None,
        font: None,
        placeholder: element.placeholder.map(|ph| PlaceholderMetadata {
            placeholder_type: ph.kind.name().to_string(),
            idx: ph.idx,
        }),
        warnings: Vec::new(),
    };

    if block_type.is_textual() {
        match element.text_body().ok_or(SkipReason::MissingTextBody) {
            Ok(body) => {
                if let Some(paragraph) = body.first_paragraph() {
                    metadata.alignment = Some(
                        paragraph
                            .alignment
                            .unwrap_or(Alignment::Left)
                            .name()
                            .to_string(),
                    );
                    metadata.font = paragraph.text_runs().next().map(|run| FontMetadata {
                        name: run.props.font.clone(),
                        size: run.props.size,
                        color: run
                            .props
                            .color
                            .as_ref()
                            .and_then(|c| c.rgb())
                            .map(|rgb| rgb.to_hex()),
                        bold: run.props.bold,
                        italic: run.props.italic,
                    });
                }
            }
            Err(reason) => {
                tracing::warn!(
                    "Font metadata of '{}' unavailable: {}",
                    element.name,
                    reason
                );
                metadata.font = Some(FontMetadata::default());
                metadata.warnings.push(reason.to_string());
            }
        }
    }
    metadata
}

/// Shape of the value a caller supplies for a block of this type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSchema {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub structure: Map<String, Value>,
}

pub fn value_schema(element: &Element, block_type: BlockType) -> ValueSchema {
    let structure = match block_type {
        BlockType::Text | BlockType::Placeholder => json!({ "text": "string" }),
        BlockType::List => json!({ "items": ["string"] }),
        BlockType::Image => json!({ "image_url": "string", "alt_text": "string" }),
        BlockType::Table => match &element.body {
            ElementBody::Table(table) => json!({
                "rows": table.row_count(),
                "columns": table.column_count(),
                "data": "array<array<string>>",
            }),
            _ => json!({ "data": "array<array<string>>" }),
        },
        BlockType::Chart => json!({ "chart_type": "string", "data": "object" }),
        BlockType::Shape => json!({}),
    };
    ValueSchema {
        block_type,
        structure: match structure {
            Value::Object(map) => map,
            _ => Map::new(),
        },
    }
}

/// Full text of an element: shape text, or table cells row by row
pub fn element_text(element: &Element) -> Option<String> {
    match &element.body {
        ElementBody::Shape(shape) => shape.text.as_ref().map(TextBody::text),
        ElementBody::Table(table) => Some(
            table
                .rows
                .iter()
                .flat_map(|row| row.cells.iter().map(|cell| cell.text.text()))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bounds;
    use crate::model::{
        ColorValue, Geometry, Paragraph, PlaceholderInfo, PlaceholderType, Rgb, Run, RunProps,
        Shape, Table, TableCell,
    };
    use pretty_assertions::assert_eq;

    fn styled_text_box() -> Element {
        let mut paragraph = Paragraph::default();
        paragraph.alignment = Some(Alignment::Center);
        paragraph.runs.push(Run::with_props(
            "{{title.main}}",
            RunProps {
                font: Some("Georgia".to_string()),
                size: Some(28.0),
                bold: Some(true),
                italic: None,
                color: Some(ColorValue::Rgb(Rgb::new(0x12, 0x34, 0xab))),
                ..RunProps::default()
            },
        ));
        let body = TextBody {
            paragraphs: vec![paragraph],
            ..TextBody::default()
        };
        let mut element = Element::text_box(Bounds::new(10, 20, 30, 40), body);
        element.name = "TextBox 1".to_string();
        element
    }

    #[test]
    fn test_text_metadata() {
        let element = styled_text_box();
        let metadata = extract(&element, BlockType::Text);
        assert_eq!(metadata.shape_type, ElementKind::Text);
        assert_eq!(metadata.shape_name.as_deref(), Some("TextBox 1"));
        assert_eq!(
            metadata.position,
            ElementPosition {
                left: 10,
                top: 20,
                width: 30,
                height: 40
            }
        );
        assert_eq!(metadata.alignment.as_deref(), Some("CENTER"));
        assert_eq!(
            metadata.font,
            Some(FontMetadata {
                name: Some("Georgia".to_string()),
                size: Some(28.0),
                color: Some("#1234ab".to_string()),
                bold: Some(true),
                italic: None,
            })
        );
        assert!(metadata.warnings.is_empty());
    }

    #[test]
    fn test_scheme_color_left_unset() {
        let mut element = styled_text_box();
        element.text_body_mut().unwrap().paragraphs[0].runs[0].props.color =
            Some(ColorValue::Scheme("accent1".to_string()));
        element.text_body_mut().unwrap().paragraphs[0].alignment = None;
        let metadata = extract(&element, BlockType::Text);
        assert_eq!(metadata.font.unwrap().color, None);
        assert_eq!(metadata.alignment.as_deref(), Some("LEFT"));
    }

    #[test]
    fn test_placeholder_without_text_body_degrades() {
        let mut element = Element::new(
            "Content Placeholder 2",
            Bounds::default(),
            ElementBody::Shape(Shape::auto_shape(Geometry::default())),
        );
        element.placeholder = Some(PlaceholderInfo {
            kind: PlaceholderType::Body,
            idx: Some(1),
        });
        let metadata = extract(&element, BlockType::Placeholder);
        assert_eq!(metadata.font, Some(FontMetadata::default()));
        assert_eq!(metadata.warnings, vec!["element has no text body".to_string()]);
        assert_eq!(
            metadata.placeholder,
            Some(PlaceholderMetadata {
                placeholder_type: "BODY".to_string(),
                idx: Some(1)
            })
        );
    }

    #[test]
    fn test_shape_metadata_has_no_font() {
        let element = Element::picture(Bounds::default(), "rId1");
        let metadata = extract(&element, BlockType::Image);
        assert!(metadata.font.is_none());
        assert!(metadata.alignment.is_none());
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["shapeType"], "image");
        assert!(json.get("font").is_none());
    }

    #[test]
    fn test_value_schemas() {
        let mut table = Table::with_grid(2, 3, Bounds::new(0, 0, 300, 100));
        *table.cell_mut(0, 0).unwrap() = TableCell::new("x");
        let element = Element::table(Bounds::default(), table);
        let schema = value_schema(&element, BlockType::Table);
        assert_eq!(schema.structure["rows"], 2);
        assert_eq!(schema.structure["columns"], 3);

        let text = styled_text_box();
        let schema = value_schema(&text, BlockType::List);
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            serde_json::json!({"type": "list", "structure": {"items": ["string"]}})
        );
        assert!(value_schema(&text, BlockType::Shape).structure.is_empty());
    }

    #[test]
    fn test_element_text_of_table() {
        let mut table = Table::with_grid(1, 2, Bounds::new(0, 0, 2, 1));
        *table.cell_mut(0, 0).unwrap() = TableCell::new("{{table.a}}");
        *table.cell_mut(0, 1).unwrap() = TableCell::new("b");
        let element = Element::table(Bounds::default(), table);
        assert_eq!(element_text(&element).as_deref(), Some("{{table.a}}\nb"));
    }
}
