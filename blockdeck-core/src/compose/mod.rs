//! Block composition: copying a block's first slide onto a target slide
//!
//! Copying runs in two phases. Every source element is first turned into a
//! ready-to-insert element (or a skip reason) while only the source is
//! borrowed; the prepared elements are then inserted into the target.

pub mod substitute;

use serde::Serialize;

use crate::document::Presentation;
use crate::error::{DeckError, Result, SkipReason};
use crate::geometry::Bounds;
use crate::model::{
    Element, ElementBody, ElementKind, Fill, Paragraph, Run, Shape, Table, TableCell, TableRow,
    TextBody,
};

pub use substitute::{replace_tokens, replace_tokens_report, SubstitutionReport};

/// Composer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeOptions {
    /// Carry outline, effects and theme style references of auto-shapes
    pub copy_shape_style: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            copy_shape_style: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CopiedElement {
    pub source_index: usize,
    pub target_id: u32,
    pub kind: ElementKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedElement {
    pub source_index: usize,
    pub name: String,
    #[serde(serialize_with = "serialize_reason")]
    pub reason: SkipReason,
}

fn serialize_reason<S: serde::Serializer>(
    reason: &SkipReason,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(reason)
}

/// Outcome of one composition
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CopyReport {
    pub copied: Vec<CopiedElement>,
    pub skipped: Vec<SkippedElement>,
}

impl CopyReport {
    pub fn copied_count(&self) -> usize {
        self.copied.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Element ready to be inserted into the target
enum Prepared {
    Element(Element),
    Picture { bytes: Vec<u8>, element: Element },
}

#[derive(Debug, Clone, Default)]
pub struct BlockComposer {
    options: ComposeOptions,
}

impl BlockComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ComposeOptions) -> Self {
        Self { options }
    }

    /// Copies the first slide of the block in `block_bytes` onto slide
    /// `target_index` of `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the block cannot be opened, has no slides, or the
    /// target slide does not exist. Per-element failures are reported, not raised.
    pub fn compose(
        &self,
        target: &mut Presentation,
        block_bytes: &[u8],
        target_index: usize,
    ) -> Result<CopyReport> {
        let block = Presentation::open(block_bytes)?;
        self.compose_from(target, &block, 0, target_index)
    }

    /// Copies slide `source_index` of an open `source` onto `target`.
    pub fn compose_from(
        &self,
        target: &mut Presentation,
        source: &Presentation,
        source_index: usize,
        target_index: usize,
    ) -> Result<CopyReport> {
        if source.slide_count() == 0 {
            return Err(DeckError::EmptyBlock);
        }
        let source_slide = source.slide(source_index)?;
        target.slide(target_index)?;

        let prepared: Vec<(usize, &Element, std::result::Result<Prepared, SkipReason>)> =
            source_slide
                .elements()
                .iter()
                .enumerate()
                .map(|(index, element)| {
                    (index, element, self.prepare(source, source_index, element))
                })
                .collect();

        let mut report = CopyReport::default();
        for (source_index, source_element, outcome) in prepared {
            let inserted = match outcome {
                Ok(Prepared::Element(element)) => {
                    Ok(target.slide_mut(target_index)?.insert_element(element))
                }
                Ok(Prepared::Picture { bytes, element }) => {
                    insert_picture(target, target_index, &bytes, element)
                }
                Err(reason) => Err(reason),
            };
            match inserted {
                Ok(target_id) => {
                    tracing::debug!(
                        "Copied element {} '{}' as id {}",
                        source_index,
                        source_element.name,
                        target_id
                    );
                    report.copied.push(CopiedElement {
                        source_index,
                        target_id,
                        kind: source_element.kind(),
                    });
                }
                Err(reason) => {
                    tracing::warn!(
                        "Skipped element {} '{}': {}",
                        source_index,
                        source_element.name,
                        reason
                    );
                    report.skipped.push(SkippedElement {
                        source_index,
                        name: source_element.name.clone(),
                        reason,
                    });
                }
            }
        }

        tracing::info!(
            "Copied {} elements to slide {} ({} skipped)",
            report.copied_count(),
            target_index,
            report.skipped_count()
        );
        Ok(report)
    }

    /// Copies a block and reports plain success; failures are logged.
    pub fn copy_block(
        &self,
        target: &mut Presentation,
        block_bytes: &[u8],
        target_index: usize,
    ) -> bool {
        match self.compose(target, block_bytes, target_index) {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Error copying block onto slide {}: {}", target_index, e);
                false
            }
        }
    }

    fn prepare(
        &self,
        source: &Presentation,
        source_index: usize,
        element: &Element,
    ) -> std::result::Result<Prepared, SkipReason> {
        match (element.kind(), &element.body) {
            (ElementKind::Text | ElementKind::Placeholder, ElementBody::Shape(shape)) => {
                let text = shape.text.as_ref().ok_or(SkipReason::MissingTextBody)?;
                Ok(Prepared::Element(named(
                    Element::text_box(element.bounds, copy_text_body(text)),
                    element,
                )))
            }
            (ElementKind::AutoShape, ElementBody::Shape(shape)) => {
                let copy = self.copy_auto_shape(element.bounds, shape);
                Ok(Prepared::Element(named(copy, element)))
            }
            (ElementKind::Image, ElementBody::Picture(picture)) => {
                let bytes = source
                    .slide_image(source_index, &picture.embed)
                    .map_err(|_| SkipReason::MissingImage(picture.embed.clone()))?;
                Ok(Prepared::Picture {
                    bytes: bytes.to_vec(),
                    element: named(Element::picture(element.bounds, String::new()), element),
                })
            }
            (ElementKind::Table, ElementBody::Table(table)) => {
                if table.row_count() == 0 || table.column_count() == 0 {
                    return Err(SkipReason::EmptyTable);
                }
                Ok(Prepared::Element(named(
                    Element::table(element.bounds, copy_table(table)),
                    element,
                )))
            }
            (kind, _) => Err(SkipReason::Unsupported(kind)),
        }
    }

    fn copy_auto_shape(&self, bounds: Bounds, shape: &Shape) -> Element {
        let mut copy = Shape {
            geometry: shape.geometry.clone(),
            fill: shape
                .fill
                .clone()
                .filter(|fill| !matches!(fill, Fill::Other(xml) if references_parts(xml))),
            text: shape.text.as_ref().map(copy_text_body),
            ..Shape::default()
        };
        if self.options.copy_shape_style {
            copy.copy_decoration_from(shape);
            copy.sp_pr_extra.retain(|xml| !references_parts(xml));
        }
        Element::new("Shape", bounds, ElementBody::Shape(copy))
    }
}

/// Copy a block with the default composer
pub fn copy_block(target: &mut Presentation, block_bytes: &[u8], target_index: usize) -> bool {
    BlockComposer::new().copy_block(target, block_bytes, target_index)
}

fn insert_picture(
    target: &mut Presentation,
    target_index: usize,
    bytes: &[u8],
    element: Element,
) -> std::result::Result<u32, SkipReason> {
    let id = target
        .add_picture(target_index, bytes, element.bounds)
        .map_err(|e| SkipReason::InvalidImage(e.to_string()))?;
    let slide = target
        .slide_mut(target_index)
        .map_err(|e| SkipReason::InvalidImage(e.to_string()))?;
    let last = slide.elements().len().saturating_sub(1);
    if let Some(inserted) = slide.element_mut(last) {
        inserted.name = element.name;
        inserted.description = element.description;
    }
    Ok(id)
}

/// Carry the source's name and description onto a copy
fn named(mut copy: Element, source: &Element) -> Element {
    if !source.name.is_empty() {
        copy.name = source.name.clone();
    }
    copy.description = source.description.clone();
    copy
}

/// Raw markup pointing at relationships of the source part
fn references_parts(xml: &str) -> bool {
    xml.contains("r:embed=") || xml.contains("r:link=") || xml.contains("r:id=")
}

/// Text with paragraph alignment and per-run font, size, weight, slant and colour
pub(crate) fn copy_text_body(body: &TextBody) -> TextBody {
    TextBody {
        word_wrap: body.word_wrap,
        paragraphs: body
            .paragraphs
            .iter()
            .map(|paragraph| Paragraph {
                alignment: paragraph.alignment,
                level: paragraph.level,
                runs: paragraph
                    .runs
                    .iter()
                    .map(|run| Run {
                        text: run.text.clone(),
                        props: run.props.portable(),
                        line_break: run.line_break,
                        field: run.field.clone(),
                    })
                    .collect(),
                ..Paragraph::default()
            })
            .collect(),
        ..TextBody::default()
    }
}

/// Same grid, spans and cell text; the target's default table style
fn copy_table(table: &Table) -> Table {
    Table {
        columns: table.columns.clone(),
        rows: table
            .rows
            .iter()
            .map(|row| TableRow {
                height: row.height,
                cells: row
                    .cells
                    .iter()
                    .map(|cell| TableCell {
                        text: TextBody::from_text(&cell.text.text()),
                        grid_span: cell.grid_span,
                        row_span: cell.row_span,
                        h_merge: cell.h_merge,
                        v_merge: cell.v_merge,
                        tc_pr: None,
                    })
                    .collect(),
            })
            .collect(),
        tbl_pr: None,
    }
}
