//! In-memory element tree of a slide
//!
//! Slides are read into [`Element`]s by the reader and written back by the
//! writer. Elements keep their original markup until they are modified, so a
//! round trip through the tree leaves untouched content byte-identical.

mod element;
pub(crate) mod reader;
mod text;
pub(crate) mod writer;

pub use element::{
    ChartFrame, Element, ElementBody, ElementKind, Fill, Geometry, OpaqueElement, Picture,
    PlaceholderInfo, PlaceholderType, Shape, Table, TableCell, TableRow,
};
pub use text::{
    normalize_newlines, Alignment, ColorValue, Paragraph, Rgb, Run, RunProps, TextBody, TextField,
};
