//! Semantic classification of slide elements

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Element, ElementKind};

/// Paragraph prefixes that mark an element as a list
const LIST_MARKERS: [&str; 5] = ["•", "-", "*", "1.", "2."];

/// Semantic field type of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Image,
    Table,
    Chart,
    Placeholder,
    List,
    Text,
    Shape,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Image => "image",
            BlockType::Table => "table",
            BlockType::Chart => "chart",
            BlockType::Placeholder => "placeholder",
            BlockType::List => "list",
            BlockType::Text => "text",
            BlockType::Shape => "shape",
        }
    }

    /// Types whose first paragraph carries font and alignment metadata
    pub fn is_textual(&self) -> bool {
        matches!(self, BlockType::Text | BlockType::List | BlockType::Placeholder)
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an element.
///
/// Image beats table beats chart beats native placeholder; anything else
/// with text is a list or text, and the rest are shapes.
pub fn classify(element: &Element) -> BlockType {
    match element.kind() {
        ElementKind::Image => BlockType::Image,
        ElementKind::Table => BlockType::Table,
        ElementKind::Chart => BlockType::Chart,
        ElementKind::Placeholder => BlockType::Placeholder,
        ElementKind::Text | ElementKind::AutoShape => match element.text_body() {
            Some(body) if is_list(body) => BlockType::List,
            Some(_) => BlockType::Text,
            None => BlockType::Shape,
        },
        ElementKind::Other => BlockType::Shape,
    }
}

fn is_list(body: &crate::model::TextBody) -> bool {
    if body.is_blank() {
        return false;
    }
    body.paragraphs.iter().any(|paragraph| {
        let text = paragraph.text();
        let text = text.trim();
        LIST_MARKERS.iter().any(|marker| text.starts_with(marker))
    })
}
