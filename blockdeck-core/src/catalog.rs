//! Field catalog
//!
//! Turns block descriptors into the ordered field records a block library
//! stores, and turns those records plus caller values back into placements.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::extract::{BlockDescriptor, BlockType, Position, Size, StyleMetadata, ValueSchema};
use crate::layout::{FieldPlacement, FieldStyle};

/// One fillable field of a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockField {
    /// Token name, or the descriptor key for token-less elements
    pub field_key: String,
    /// Token text as written in the block
    pub placeholder: String,
    #[serde(rename = "type")]
    pub field_type: BlockType,
    pub required: bool,
    pub order_index: i64,
    pub metadata: FieldMetadata,
}

impl BlockField {
    /// `label.field_key` when the field came from a token
    pub fn token_key(&self) -> Option<String> {
        self.metadata
            .label
            .as_ref()
            .map(|label| format!("{label}.{}", self.field_key))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub slide_number: usize,
    pub position: Position,
    pub size: Size,
    pub value_schema: ValueSchema,
    pub style_metadata: StyleMetadata,
}

/// One field per token, or one synthetic field per token-less descriptor,
/// numbered in order
pub fn fields_from_descriptors(descriptors: &[BlockDescriptor]) -> Vec<BlockField> {
    let mut fields = Vec::new();
    for descriptor in descriptors {
        let metadata = |label: Option<String>| FieldMetadata {
            label,
            slide_number: descriptor.slide_number,
            position: descriptor.position,
            size: descriptor.size,
            value_schema: descriptor.value_schema.clone(),
            style_metadata: descriptor.style_metadata.clone(),
        };
        if descriptor.tokens.is_empty() {
            fields.push(BlockField {
                field_key: descriptor.key.clone(),
                placeholder: descriptor.placeholder(),
                field_type: descriptor.block_type,
                required: false,
                order_index: fields.len() as i64,
                metadata: metadata(None),
            });
            continue;
        }
        for token in &descriptor.tokens {
            fields.push(BlockField {
                field_key: token.name.clone(),
                placeholder: token.raw_text.clone(),
                field_type: descriptor.block_type,
                required: false,
                order_index: fields.len() as i64,
                metadata: metadata(Some(token.label.clone())),
            });
        }
    }
    tracing::info!(
        "Cataloged {} fields from {} blocks",
        fields.len(),
        descriptors.len()
    );
    fields
}

/// Placements for the fields that have a value.
///
/// A value is looked up by `label.name`, then by field key, then by the
/// placeholder text. Each placement carries the field's extracted style.
pub fn placements_for(fields: &[BlockField], values: &HashMap<String, String>) -> Vec<FieldPlacement> {
    fields
        .iter()
        .filter_map(|field| {
            let token_key = field.token_key();
            let value = token_key
                .as_ref()
                .and_then(|key| values.get(key))
                .or_else(|| values.get(&field.field_key))
                .or_else(|| values.get(&field.placeholder));
            let Some(value) = value else {
                tracing::debug!("No value for field '{}'", field.field_key);
                return None;
            };
            let placement = FieldPlacement::new(value.clone(), field.order_index)
                .with_style(FieldStyle::from(&field.metadata.style_metadata));
            Some(match token_key {
                Some(key) => placement.with_key(key),
                None => placement,
            })
        })
        .collect()
}

/// `label.name` to value map for the in-run substitution fallback
pub fn substitution_values(placements: &[FieldPlacement]) -> HashMap<String, String> {
    placements
        .iter()
        .filter_map(|placement| {
            placement
                .key
                .as_ref()
                .map(|key| (key.clone(), placement.text.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Presentation;
    use crate::extract::extract_blocks;
    use crate::geometry::Bounds;
    use crate::model::{Element, Paragraph, Run, RunProps, TextBody};
    use crate::layout::SizeValue;
    use pretty_assertions::assert_eq;

    fn descriptors() -> Vec<BlockDescriptor> {
        let mut deck = Presentation::with_blank_slide().unwrap();
        let mut paragraph = Paragraph::default();
        paragraph.runs.push(Run::with_props(
            "{{title.main}} / {{text.author}}",
            RunProps {
                size: Some(28.0),
                bold: Some(true),
                ..RunProps::default()
            },
        ));
        let slide = deck.slide_mut(0).unwrap();
        slide.insert_element(Element::text_box(
            Bounds::from_inches(1.0, 1.0, 8.0, 1.0),
            TextBody {
                paragraphs: vec![paragraph],
                ..TextBody::default()
            },
        ));
        slide.insert_element(Element::picture(Bounds::from_inches(1.0, 3.0, 2.0, 2.0), "rId5"));
        extract_blocks(&deck)
    }

    #[test]
    fn test_one_field_per_token_then_synthetic() {
        let fields = fields_from_descriptors(&descriptors());
        let summary: Vec<_> = fields
            .iter()
            .map(|f| {
                (
                    f.field_key.as_str(),
                    f.placeholder.as_str(),
                    f.field_type,
                    f.order_index,
                    f.metadata.label.as_deref(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("main", "{{title.main}}", BlockType::Text, 0, Some("title")),
                ("author", "{{text.author}}", BlockType::Text, 1, Some("text")),
                (
                    "image_s1_i1",
                    "{{image.image_s1_i1}}",
                    BlockType::Image,
                    2,
                    None
                ),
            ]
        );
        assert_eq!(fields[0].token_key().as_deref(), Some("title.main"));
        assert_eq!(fields[2].token_key(), None);
    }

    #[test]
    fn test_placements_carry_style_and_key() {
        let fields = fields_from_descriptors(&descriptors());
        let values: HashMap<String, String> = [
            ("title.main", "Quarterly review"),
            ("author", "Finance"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let placements = placements_for(&fields, &values);
        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].text, "Quarterly review");
        assert_eq!(placements[0].key.as_deref(), Some("title.main"));
        assert_eq!(placements[0].style.size, Some(SizeValue::Points(28.0)));
        assert_eq!(placements[0].style.bold, Some(true));
        assert_eq!(placements[0].style.alignment.as_deref(), Some("LEFT"));
        assert_eq!(placements[1].order_index, 1);

        let map = substitution_values(&placements);
        assert_eq!(map.get("text.author").map(String::as_str), Some("Finance"));
    }

    #[test]
    fn test_field_json_shape() {
        let fields = fields_from_descriptors(&descriptors());
        let json = serde_json::to_value(&fields[0]).unwrap();
        assert_eq!(json["fieldKey"], "main");
        assert_eq!(json["type"], "text");
        assert_eq!(json["orderIndex"], 0);
        assert_eq!(json["metadata"]["label"], "title");
        assert_eq!(json["metadata"]["slideNumber"], 1);
    }
}
