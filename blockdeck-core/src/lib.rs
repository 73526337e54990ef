//! # blockdeck
//!
//! Semantic blocks for presentation documents: extract field tokens from
//! single-slide `.pptx` fragments and compose those fragments into decks with
//! automatic text layout.
//!
//! ## Features
//!
//! - **Document Model**: Open, edit and save OOXML presentations; untouched slides and elements are written back byte for byte
//! - **Extraction**: Classify every element, find `{{label.name}}` tokens and record geometry, style and value schemas
//! - **Composition**: Copy a block's text, shapes, pictures and tables onto a target slide
//! - **Auto-layout**: Stack field values vertically and shrink fonts uniformly when they overflow the slide
//! - **Substitution**: Replace tokens in place, run by run, as a fallback
//! - **Previews**: Wireframe PNG previews of slides and blocks
//!
//! ## Quick Start
//!
//! ### Extracting fields
//!
//! ```rust
//! use blockdeck::{extract_blocks, Bounds, Element, Presentation, Result, TextBody};
//!
//! # fn main() -> Result<()> {
//! let mut block = Presentation::with_blank_slide()?;
//! block.slide_mut(0)?.insert_element(Element::text_box(
//!     Bounds::from_inches(1.0, 1.0, 8.0, 1.0),
//!     TextBody::from_text("{{title.main}}"),
//! ));
//!
//! for descriptor in extract_blocks(&block) {
//!     println!("{} {} {:?}", descriptor.slide_number, descriptor.block_type, descriptor.tokens);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Composing and filling a slide
//!
//! ```rust
//! use blockdeck::layout::{layout, FieldPlacement};
//! use blockdeck::{BlockComposer, Bounds, Element, Presentation, Result, TextBody};
//!
//! # fn main() -> Result<()> {
//! # let mut block = Presentation::with_blank_slide()?;
//! # block.slide_mut(0)?.insert_element(Element::text_box(
//! #     Bounds::from_inches(1.0, 1.0, 8.0, 1.0),
//! #     TextBody::from_text("{{title.main}}"),
//! # ));
//! # let block_bytes = block.save()?;
//! let mut deck = Presentation::with_blank_slide()?;
//! let report = BlockComposer::new().compose(&mut deck, &block_bytes, 0)?;
//! println!("copied {} elements", report.copied.len());
//!
//! let mut canvas = deck.canvas_mut(0)?;
//! let filled = layout(&mut canvas, &[FieldPlacement::new("Quarterly review", 0)]);
//! assert!(filled);
//!
//! let bytes = deck.save()?;
//! assert!(!bytes.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`package`] - Zip container, content types and relationships
//! - [`document`] - Presentations, slides, layouts and canvases
//! - [`model`] - Slide elements and text bodies
//! - [`extract`] - Classification, tokens and style metadata
//! - [`compose`] - Block copying and token substitution
//! - [`layout`] - Automatic text layout
//! - [`catalog`] - Field records built from extracted blocks
//! - [`preview`] - PNG wireframe previews

pub mod catalog;
pub mod compose;
pub mod document;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod package;
pub mod preview;

// Re-export document types
pub use document::{Canvas, Layout, Presentation, Slide};
pub use error::{DeckError, Result, SkipReason};
pub use geometry::{Bounds, Emu, EMU_PER_INCH, EMU_PER_POINT};
pub use model::{Element, ElementBody, ElementKind, Paragraph, Run, RunProps, TextBody};

// Re-export pipeline entry points
pub use catalog::{fields_from_descriptors, placements_for, BlockField};
pub use compose::{copy_block, replace_tokens, BlockComposer, ComposeOptions, CopyReport};
pub use extract::{classify, extract_blocks, BlockDescriptor, BlockType, FieldToken};
pub use layout::{FieldPlacement, LayoutOptions, LayoutResult, TextLayout};

/// Current version of blockdeck
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_presentation_has_default_size() {
        let deck = Presentation::new().unwrap();
        assert_eq!(deck.slide_size(), (10 * EMU_PER_INCH, 7 * EMU_PER_INCH + EMU_PER_INCH / 2));
        assert_eq!(deck.slide_count(), 0);
    }

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
    }
}
