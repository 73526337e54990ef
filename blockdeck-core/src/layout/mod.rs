//! Automatic text layout
//!
//! Fields are stacked top to bottom inside the slide margins, one text box
//! per field. Box heights come from a closed-form character-width estimate:
//!
//! ```text
//! avg_char_width = (size / 72) * char_width_factor
//! chars_per_line = max(1, floor(box_width / avg_char_width))
//! lines          = max(1, chars / chars_per_line)
//! height         = lines * (size / 72) * line_spacing * line_height_factor
//! ```
//!
//! If the stacked height exceeds the slide height every run of every new box
//! is shrunk by `slide_height / total_height`, floored at the minimum size.
//! Positions are not reflowed after shrinking.

pub mod cleanup;
pub mod style;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::Canvas;
use crate::error::{DeckError, Result};
use crate::geometry::Bounds;
use crate::model::{normalize_newlines, Element, Paragraph, TextBody};

pub use cleanup::{ArtifactFilter, CleanupOptions, RedFillArtifact};
pub use style::{resolve_style, FieldStyle, SizeValue, TextStyle};

/// One value to place on a canvas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPlacement {
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "font_metadata")]
    pub style: FieldStyle,
    #[serde(default, alias = "order_index")]
    pub order_index: i64,
    /// `label.name` of the token the value replaces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl FieldPlacement {
    pub fn new(text: impl Into<String>, order_index: i64) -> Self {
        Self {
            text: text.into(),
            order_index,
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: FieldStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Layout constants; lengths in inches, sizes in points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutOptions {
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_top: f64,
    pub field_spacing: f64,
    pub line_spacing: f64,
    pub char_width_factor: f64,
    pub line_height_factor: f64,
    pub min_font_size: f64,
    /// Applied under each field's own style
    pub default_style: FieldStyle,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            margin_left: 1.0,
            margin_right: 1.0,
            margin_top: 1.0,
            field_spacing: 0.3,
            line_spacing: 1.0,
            char_width_factor: 0.6,
            line_height_factor: 1.2,
            min_font_size: 8.0,
            default_style: FieldStyle::default(),
        }
    }
}

impl LayoutOptions {
    /// Parse options from JSON; missing members keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a valid options object.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(DeckError::from)
    }

    /// Usable box width for a canvas `canvas_width` inches wide
    pub fn box_width(&self, canvas_width: f64) -> f64 {
        canvas_width - self.margin_left - self.margin_right
    }

    /// Estimated rendered height in inches of `text` at `size` points
    pub fn estimate_height(&self, text: &str, size: f64, box_width: f64) -> f64 {
        let avg_char_width = (size / 72.0) * self.char_width_factor;
        let chars_per_line = ((box_width / avg_char_width).floor() as i64).max(1);
        let lines = (text.chars().count() as f64 / chars_per_line as f64).max(1.0);
        let line_height = (size / 72.0) * self.line_spacing * self.line_height_factor;
        lines * line_height
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("No room for text: box width {0:.2} in")]
    NoWidth(f64),

    #[error("Canvas height {0:.2} in is not positive")]
    NoHeight(f64),
}

/// Outcome of a layout pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResult {
    /// Ids of the created text boxes, in placement order
    pub created: Vec<u32>,
    pub removed: usize,
    /// Final running top in inches
    pub total_height: f64,
    pub shrink_factor: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct TextLayout {
    options: LayoutOptions,
    cleanup: CleanupOptions,
}

impl TextLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LayoutOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn cleanup(mut self, cleanup: CleanupOptions) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Clean the canvas, then stack the non-blank fields by `order_index`.
    ///
    /// # Errors
    ///
    /// Returns an error, before touching the canvas, if the margins leave no
    /// width or the canvas has no height.
    pub fn try_layout(
        &self,
        canvas: &mut Canvas<'_>,
        fields: &[FieldPlacement],
    ) -> std::result::Result<LayoutResult, LayoutError> {
        let options = &self.options;
        let canvas_width = canvas.width_inches();
        let canvas_height = canvas.height_inches();
        let box_width = options.box_width(canvas_width);
        if box_width <= 0.0 {
            return Err(LayoutError::NoWidth(box_width));
        }
        if canvas_height <= 0.0 {
            return Err(LayoutError::NoHeight(canvas_height));
        }
        tracing::info!(
            "Laying out {} fields on {:.2}\" x {:.2}\" canvas",
            fields.len(),
            canvas_width,
            canvas_height
        );

        let removal = cleanup::removal_set(canvas.elements(), &self.cleanup);
        let removed = canvas.remove_elements(&removal);
        tracing::info!("Removed {} elements before layout", removed);

        let mut fields: Vec<&FieldPlacement> = fields
            .iter()
            .filter(|field| {
                if field.is_blank() {
                    tracing::debug!("Skipping empty field at order index {}", field.order_index);
                }
                !field.is_blank()
            })
            .collect();
        fields.sort_by_key(|field| field.order_index);

        let mut result = LayoutResult {
            removed,
            ..LayoutResult::default()
        };
        let mut top = options.margin_top;
        for field in fields {
            let style = resolve_style(&field.style.or(&options.default_style));
            let height = options.estimate_height(&field.text, style.size, box_width);
            let bounds = Bounds::from_inches(options.margin_left, top, box_width, height);
            let id = canvas.insert_element(field_text_box(bounds, &field.text, &style));
            tracing::debug!(
                "Placed field {} ({} chars) at {:.2}\" with height {:.2}\"",
                id,
                field.text.chars().count(),
                top,
                height
            );
            result.created.push(id);
            top += height + options.field_spacing;
        }
        result.total_height = top;

        if top > canvas_height {
            let factor = canvas_height / top;
            tracing::warn!(
                "Content overflow: {:.2}\" > {:.2}\", shrinking fonts by {:.2}",
                top,
                canvas_height,
                factor
            );
            shrink_fonts(canvas, &result.created, factor, options.min_font_size);
            result.shrink_factor = Some(factor);
        }

        tracing::info!(
            "Placed {} fields, total height {:.2}\"",
            result.created.len(),
            result.total_height
        );
        Ok(result)
    }

    /// Like [`try_layout`](Self::try_layout), reporting plain success
    pub fn layout(&self, canvas: &mut Canvas<'_>, fields: &[FieldPlacement]) -> bool {
        match self.try_layout(canvas, fields) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Error laying out fields: {}", e);
                false
            }
        }
    }
}

/// Lay out fields with the default options
pub fn layout(canvas: &mut Canvas<'_>, fields: &[FieldPlacement]) -> bool {
    TextLayout::new().layout(canvas, fields)
}

/// Lay out fields with the default options, reporting the details
pub fn try_layout(
    canvas: &mut Canvas<'_>,
    fields: &[FieldPlacement],
) -> std::result::Result<LayoutResult, LayoutError> {
    TextLayout::new().try_layout(canvas, fields)
}

/// Word-wrapped text box, every paragraph and run in `style`
fn field_text_box(bounds: Bounds, text: &str, style: &TextStyle) -> Element {
    let props = style.run_props();
    let paragraphs = normalize_newlines(text)
        .split('\n')
        .map(|line| Paragraph {
            alignment: Some(style.alignment),
            ..Paragraph::with_props(line, props.clone())
        })
        .collect();
    let mut body = TextBody {
        paragraphs,
        ..TextBody::default()
    };
    body.set_word_wrap(true);
    Element::text_box(bounds, body)
}

fn shrink_fonts(canvas: &mut Canvas<'_>, ids: &[u32], factor: f64, min_size: f64) {
    let indices: Vec<usize> = canvas
        .elements()
        .iter()
        .enumerate()
        .filter(|(_, element)| ids.contains(&element.id))
        .map(|(index, _)| index)
        .collect();
    for index in indices {
        let Some(body) = canvas.element_mut(index).and_then(Element::text_body_mut) else {
            continue;
        };
        // line breaks carry the field's size too
        for run in body.paragraphs.iter_mut().flat_map(|p| p.runs.iter_mut()) {
            if let Some(size) = run.props.size {
                let shrunk = (size * factor).floor().max(min_size);
                tracing::debug!("Shrunk font {}pt -> {}pt", size, shrunk);
                run.props.size = Some(shrunk);
            }
        }
    }
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
