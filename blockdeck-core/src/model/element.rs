//! Visual elements of a slide

use std::fmt;

use serde::{Deserialize, Serialize};

use super::text::{ColorValue, TextBody};
use crate::geometry::{Bounds, Emu};

/// Native kind of an element, as stored in the slide's shape tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// Free-floating text box (`p:sp` with `txBox="1"`)
    Text,
    /// Picture (`p:pic`)
    Image,
    /// Table graphic frame
    Table,
    /// Chart graphic frame
    Chart,
    /// Preset or custom geometry shape
    AutoShape,
    /// Shape bound to a layout placeholder
    Placeholder,
    /// Group shapes, connectors and unrecognised frames
    Other,
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Text => "text",
            ElementKind::Image => "image",
            ElementKind::Table => "table",
            ElementKind::Chart => "chart",
            ElementKind::AutoShape => "auto_shape",
            ElementKind::Placeholder => "placeholder",
            ElementKind::Other => "other",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Placeholder type (`p:ph/@type`); absent means `obj`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderType {
    Title,
    Body,
    CenterTitle,
    Subtitle,
    Date,
    SlideNumber,
    Footer,
    Header,
    Object,
    Chart,
    Table,
    ClipArt,
    Diagram,
    Media,
    SlideImage,
    Picture,
}

impl PlaceholderType {
    pub fn from_ooxml(value: &str) -> Option<Self> {
        Some(match value {
            "title" => PlaceholderType::Title,
            "body" => PlaceholderType::Body,
            "ctrTitle" => PlaceholderType::CenterTitle,
            "subTitle" => PlaceholderType::Subtitle,
            "dt" => PlaceholderType::Date,
            "sldNum" => PlaceholderType::SlideNumber,
            "ftr" => PlaceholderType::Footer,
            "hdr" => PlaceholderType::Header,
            "obj" => PlaceholderType::Object,
            "chart" => PlaceholderType::Chart,
            "tbl" => PlaceholderType::Table,
            "clipArt" => PlaceholderType::ClipArt,
            "dgm" => PlaceholderType::Diagram,
            "media" => PlaceholderType::Media,
            "sldImg" => PlaceholderType::SlideImage,
            "pic" => PlaceholderType::Picture,
            _ => return None,
        })
    }

    pub fn ooxml(&self) -> &'static str {
        match self {
            PlaceholderType::Title => "title",
            PlaceholderType::Body => "body",
            PlaceholderType::CenterTitle => "ctrTitle",
            PlaceholderType::Subtitle => "subTitle",
            PlaceholderType::Date => "dt",
            PlaceholderType::SlideNumber => "sldNum",
            PlaceholderType::Footer => "ftr",
            PlaceholderType::Header => "hdr",
            PlaceholderType::Object => "obj",
            PlaceholderType::Chart => "chart",
            PlaceholderType::Table => "tbl",
            PlaceholderType::ClipArt => "clipArt",
            PlaceholderType::Diagram => "dgm",
            PlaceholderType::Media => "media",
            PlaceholderType::SlideImage => "sldImg",
            PlaceholderType::Picture => "pic",
        }
    }

    /// Upper-case name used in style metadata
    pub fn name(&self) -> &'static str {
        match self {
            PlaceholderType::Title => "TITLE",
            PlaceholderType::Body => "BODY",
            PlaceholderType::CenterTitle => "CENTER_TITLE",
            PlaceholderType::Subtitle => "SUBTITLE",
            PlaceholderType::Date => "DATE",
            PlaceholderType::SlideNumber => "SLIDE_NUMBER",
            PlaceholderType::Footer => "FOOTER",
            PlaceholderType::Header => "HEADER",
            PlaceholderType::Object => "OBJECT",
            PlaceholderType::Chart => "CHART",
            PlaceholderType::Table => "TABLE",
            PlaceholderType::ClipArt => "CLIP_ART",
            PlaceholderType::Diagram => "DIAGRAM",
            PlaceholderType::Media => "MEDIA",
            PlaceholderType::SlideImage => "SLIDE_IMAGE",
            PlaceholderType::Picture => "PICTURE",
        }
    }

    /// Generic content placeholders that hold body text or arbitrary objects
    pub fn is_content(&self) -> bool {
        matches!(self, PlaceholderType::Body | PlaceholderType::Object)
    }

    /// Date, footer and slide number placeholders are not cloned onto new slides
    pub fn is_furniture(&self) -> bool {
        matches!(
            self,
            PlaceholderType::Date | PlaceholderType::Footer | PlaceholderType::SlideNumber
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderInfo {
    pub kind: PlaceholderType,
    pub idx: Option<u32>,
}

/// Shape outline geometry
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// `a:prstGeom/@prst`, e.g. `rect`, `roundRect`
    Preset(String),
    /// Raw `a:custGeom` markup, or `a:prstGeom` carrying adjust values
    Custom(String),
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry::Preset("rect".to_string())
    }
}

/// Shape fill (`a:noFill`, `a:solidFill`, ...)
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    NoFill,
    Solid(ColorValue),
    /// Gradient, picture, pattern or group fill, kept as raw markup
    Other(String),
}

impl Fill {
    /// Direct RGB colour of a solid fill
    pub fn solid_rgb(&self) -> Option<super::text::Rgb> {
        match self {
            Fill::Solid(color) => color.rgb(),
            _ => None,
        }
    }
}

/// `p:sp`: text boxes, auto-shapes and placeholder shapes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    pub text_box: bool,
    pub geometry: Option<Geometry>,
    pub fill: Option<Fill>,
    pub text: Option<TextBody>,
    /// Remaining `p:spPr` children (outline, effects), raw
    pub(crate) sp_pr_extra: Vec<String>,
    /// `p:style` theme references, raw
    pub(crate) style: Option<String>,
}

impl Shape {
    pub fn text_box(text: TextBody) -> Self {
        Self {
            text_box: true,
            geometry: Some(Geometry::default()),
            fill: Some(Fill::NoFill),
            text: Some(text),
            ..Self::default()
        }
    }

    pub fn auto_shape(geometry: Geometry) -> Self {
        Self {
            geometry: Some(geometry),
            ..Self::default()
        }
    }

    /// Copy outline, effects and theme style references from another shape
    pub fn copy_decoration_from(&mut self, other: &Shape) {
        self.sp_pr_extra = other.sp_pr_extra.clone();
        self.style = other.style.clone();
    }
}

/// `p:pic`
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    /// Relationship id of the image part (`a:blip/@r:embed`)
    pub embed: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCell {
    pub text: TextBody,
    pub grid_span: Option<u32>,
    pub row_span: Option<u32>,
    pub h_merge: bool,
    pub v_merge: bool,
    pub(crate) tc_pr: Option<String>,
}

impl TableCell {
    pub fn new(text: &str) -> Self {
        Self {
            text: TextBody::from_text(text),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    pub height: Emu,
    pub cells: Vec<TableCell>,
}

/// `a:tbl` inside a graphic frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<Emu>,
    pub rows: Vec<TableRow>,
    pub(crate) tbl_pr: Option<String>,
}

impl Table {
    /// Empty table with evenly divided column widths and row heights
    pub fn with_grid(rows: usize, columns: usize, bounds: Bounds) -> Self {
        let column_width = if columns > 0 {
            (bounds.width / columns as Emu).max(1)
        } else {
            0
        };
        let row_height = if rows > 0 {
            (bounds.height / rows as Emu).max(1)
        } else {
            0
        };
        Self {
            columns: vec![column_width; columns],
            rows: (0..rows)
                .map(|_| TableRow {
                    height: row_height,
                    cells: (0..columns).map(|_| TableCell::default()).collect(),
                })
                .collect(),
            tbl_pr: None,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&TableCell> {
        self.rows.get(row).and_then(|r| r.cells.get(column))
    }

    pub fn cell_mut(&mut self, row: usize, column: usize) -> Option<&mut TableCell> {
        self.rows.get_mut(row).and_then(|r| r.cells.get_mut(column))
    }
}

/// Chart graphic frame, kept as raw markup
#[derive(Debug, Clone, PartialEq)]
pub struct ChartFrame {
    /// Relationship id of the chart part
    pub chart_rel: Option<String>,
    pub(crate) xml: String,
}

/// Group shapes, connectors, alternate content and unknown frames
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueElement {
    /// Local tag name, e.g. `grpSp`
    pub tag: String,
    pub(crate) xml: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementBody {
    Shape(Shape),
    Picture(Picture),
    Table(Table),
    Chart(ChartFrame),
    Opaque(OpaqueElement),
}

/// One visual item on a slide
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// `cNvPr/@id`, unique within the slide
    pub id: u32,
    pub name: String,
    pub description: Option<String>,
    pub bounds: Bounds,
    pub placeholder: Option<PlaceholderInfo>,
    pub body: ElementBody,
    /// Bounds resolved from the layout when the element has no own transform
    pub(crate) inherited_bounds: Option<Bounds>,
    /// Original markup, re-emitted verbatim until the element is touched
    pub(crate) raw: Option<String>,
}

impl Element {
    pub fn new(name: impl Into<String>, bounds: Bounds, body: ElementBody) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: None,
            bounds,
            placeholder: None,
            body,
            inherited_bounds: None,
            raw: None,
        }
    }

    /// New text box holding `text`
    pub fn text_box(bounds: Bounds, text: TextBody) -> Self {
        Self::new("TextBox", bounds, ElementBody::Shape(Shape::text_box(text)))
    }

    pub fn picture(bounds: Bounds, embed: impl Into<String>) -> Self {
        Self::new(
            "Picture",
            bounds,
            ElementBody::Picture(Picture {
                embed: embed.into(),
            }),
        )
    }

    pub fn table(bounds: Bounds, table: Table) -> Self {
        Self::new("Table", bounds, ElementBody::Table(table))
    }

    pub fn kind(&self) -> ElementKind {
        match &self.body {
            ElementBody::Picture(_) => ElementKind::Image,
            ElementBody::Table(_) => ElementKind::Table,
            ElementBody::Chart(_) => ElementKind::Chart,
            ElementBody::Shape(_) if self.placeholder.is_some() => ElementKind::Placeholder,
            ElementBody::Shape(shape) if shape.text_box => ElementKind::Text,
            ElementBody::Shape(_) => ElementKind::AutoShape,
            ElementBody::Opaque(_) => ElementKind::Other,
        }
    }

    pub fn shape(&self) -> Option<&Shape> {
        match &self.body {
            ElementBody::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn shape_mut(&mut self) -> Option<&mut Shape> {
        match &mut self.body {
            ElementBody::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    /// Text frame of a shape; pictures, tables and frames have none
    pub fn text_body(&self) -> Option<&TextBody> {
        self.shape().and_then(|shape| shape.text.as_ref())
    }

    pub fn text_body_mut(&mut self) -> Option<&mut TextBody> {
        self.shape_mut().and_then(|shape| shape.text.as_mut())
    }

    pub fn text(&self) -> Option<String> {
        self.text_body().map(TextBody::text)
    }

    pub fn has_text_frame(&self) -> bool {
        self.text_body().is_some()
    }

    /// Whether the element is still backed by its original markup
    pub fn is_pristine(&self) -> bool {
        self.raw.is_some()
    }

    /// Forget the original markup so the element is regenerated on save
    pub(crate) fn touch(&mut self) {
        self.raw = None;
    }
}
