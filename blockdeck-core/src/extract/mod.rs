//! Block extraction
//!
//! One pass over a presentation classifies every element, finds the field
//! tokens in its text and records its geometry, style and value schema.
//!
//! ```rust
//! use blockdeck::extract::extract_blocks;
//! use blockdeck::{Bounds, Element, Presentation, TextBody};
//!
//! # fn main() -> blockdeck::Result<()> {
//! let mut deck = Presentation::with_blank_slide()?;
//! deck.slide_mut(0)?.insert_element(Element::text_box(
//!     Bounds::from_inches(1.0, 1.0, 8.0, 1.0),
//!     TextBody::from_text("Report: {{title.main}} by {{text.author}}"),
//! ));
//!
//! let blocks = extract_blocks(&deck);
//! assert_eq!(blocks[0].key, "main");
//! assert_eq!(blocks[0].tokens.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod metadata;
pub mod tokens;

use serde::{Deserialize, Serialize};

use crate::document::{Presentation, Slide};
use crate::geometry::Emu;
use crate::model::Element;

pub use classify::{classify, BlockType};
pub use metadata::{FontMetadata, PlaceholderMetadata, StyleMetadata, ValueSchema};
pub use tokens::FieldToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: Emu,
    pub y: Emu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: Emu,
    pub height: Emu,
}

/// Structural description of one element of a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDescriptor {
    /// 1-based
    pub slide_number: usize,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub key: String,
    pub value_schema: ValueSchema,
    pub position: Position,
    pub size: Size,
    pub style_metadata: StyleMetadata,
    pub tokens: Vec<FieldToken>,
}

impl BlockDescriptor {
    /// Token to substitute for this element: the first real token, or
    /// `{{<type>.<key>}}` when the element has none
    pub fn placeholder(&self) -> String {
        match self.tokens.first() {
            Some(token) => token.raw_text.clone(),
            None => format!("{{{{{}.{}}}}}", self.block_type, self.key),
        }
    }
}

/// Describe every element of every slide
pub fn extract_blocks(presentation: &Presentation) -> Vec<BlockDescriptor> {
    let blocks: Vec<BlockDescriptor> = presentation
        .slides()
        .iter()
        .enumerate()
        .flat_map(|(index, slide)| extract_slide(slide, index + 1))
        .collect();
    tracing::info!(
        "Extracted {} blocks from {} slides",
        blocks.len(),
        presentation.slide_count()
    );
    blocks
}

/// Describe every element of one slide; `slide_number` is 1-based
pub fn extract_slide(slide: &Slide, slide_number: usize) -> Vec<BlockDescriptor> {
    slide
        .elements()
        .iter()
        .enumerate()
        .map(|(index, element)| describe(element, slide_number, index))
        .collect()
}

/// Describe one element
pub fn describe(element: &Element, slide_number: usize, index: usize) -> BlockDescriptor {
    let block_type = classify(element);
    let tokens = metadata::element_text(element)
        .map(|text| tokens::extract(&text))
        .unwrap_or_default();
    let key = match tokens.first() {
        Some(token) => token.name.clone(),
        None => format!("{block_type}_s{slide_number}_i{index}"),
    };
    tracing::debug!(
        "Slide {} element {} '{}': {} with {} tokens",
        slide_number,
        index,
        element.name,
        block_type,
        tokens.len()
    );

    BlockDescriptor {
        slide_number,
        block_type,
        key,
        value_schema: metadata::value_schema(element, block_type),
        position: Position {
            x: element.bounds.left,
            y: element.bounds.top,
        },
        size: Size {
            width: element.bounds.width,
            height: element.bounds.height,
        },
        style_metadata: metadata::extract(element, block_type),
        tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkipReason;
    use crate::geometry::Bounds;
    use crate::model::{ElementBody, Geometry, PlaceholderInfo, PlaceholderType, Shape, TextBody};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_synthetic_key_and_placeholder() {
        let element = Element::picture(Bounds::new(1, 2, 3, 4), "rId1");
        let descriptor = describe(&element, 2, 5);
        assert_eq!(descriptor.block_type, BlockType::Image);
        assert_eq!(descriptor.key, "image_s2_i5");
        assert_eq!(descriptor.placeholder(), "{{image.image_s2_i5}}");
        assert_eq!(descriptor.position, Position { x: 1, y: 2 });
        assert_eq!(descriptor.size, Size { width: 3, height: 4 });
        assert!(descriptor.tokens.is_empty());
    }

    #[test]
    fn test_key_from_first_token() {
        let element = Element::text_box(
            Bounds::default(),
            TextBody::from_text("{{title.about_project}} and {{text.more}}"),
        );
        let descriptor = describe(&element, 1, 0);
        assert_eq!(descriptor.key, "about_project");
        assert_eq!(descriptor.placeholder(), "{{title.about_project}}");
    }

    #[test]
    fn test_descriptor_json_shape() {
        let element = Element::text_box(Bounds::default(), TextBody::from_text("{{title.main}}"));
        let json = serde_json::to_value(describe(&element, 1, 0)).unwrap();
        for field in [
            "slideNumber",
            "type",
            "key",
            "valueSchema",
            "position",
            "size",
            "styleMetadata",
            "tokens",
        ] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
        assert_eq!(json["tokens"][0]["rawText"], "{{title.main}}");
        assert_eq!(json["valueSchema"]["structure"]["text"], "string");
    }

    #[test]
    fn test_failed_metadata_is_collected_not_fatal() {
        let mut placeholder = Element::new(
            "Content Placeholder 1",
            Bounds::default(),
            ElementBody::Shape(Shape::auto_shape(Geometry::default())),
        );
        placeholder.placeholder = Some(PlaceholderInfo {
            kind: PlaceholderType::Body,
            idx: Some(1),
        });
        let mut deck = Presentation::with_blank_slide().unwrap();
        let slide = deck.slide_mut(0).unwrap();
        slide.insert_element(placeholder);
        slide.insert_element(Element::text_box(
            Bounds::default(),
            TextBody::from_text("{{text.body}}"),
        ));

        let blocks = extract_slide(deck.slide(0).unwrap(), 1);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].block_type, BlockType::Placeholder);
        assert_eq!(
            blocks[0].style_metadata.warnings,
            vec![SkipReason::MissingTextBody.to_string()]
        );
        assert_eq!(blocks[1].key, "body");
        assert!(blocks[1].style_metadata.warnings.is_empty());
    }

    #[test]
    fn test_extract_blocks_numbers_slides_from_one() {
        let mut deck = Presentation::new().unwrap();
        for text in ["{{title.a}}", "{{title.b}}"] {
            let index = deck.add_blank_slide().unwrap();
            deck.slide_mut(index)
                .unwrap()
                .insert_element(Element::text_box(Bounds::default(), TextBody::from_text(text)));
        }
        let blocks = extract_blocks(&deck);
        let numbered: Vec<_> = blocks
            .iter()
            .map(|b| (b.slide_number, b.key.as_str()))
            .collect();
        assert_eq!(numbered, vec![(1, "a"), (2, "b")]);
    }
}
