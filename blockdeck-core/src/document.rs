use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};
use std::path::Path;

use roxmltree::{Document, Node};

use crate::error::{DeckError, Result};
use crate::geometry::{emu_to_inches, Bounds, Emu};
use crate::model::reader::read_elements;
use crate::model::writer::splice_shape_tree;
use crate::model::{Element, ElementBody, PlaceholderType, Shape, TextBody};
use crate::package::template::{PRESENTATION_PART, SLIDE_SKELETON};
use crate::package::xml::{
    attr_i64, attr_u32, child, children, ensure_namespaces, is, CT_SLIDE, NS_P, NS_R,
    REL_IMAGE, REL_NOTES_SLIDE, REL_OFFICE_DOCUMENT, REL_SLIDE, REL_SLIDE_LAYOUT,
    REL_SLIDE_MASTER,
};
use crate::package::{relative_target, rels_part_for, resolve_target, Package, Relationships};

/// Slide size of a new presentation: 10 x 7.5 inches
pub const DEFAULT_SLIDE_WIDTH: Emu = 9_144_000;
pub const DEFAULT_SLIDE_HEIGHT: Emu = 6_858_000;

/// First slide id PowerPoint accepts in `p:sldIdLst`
const MIN_SLIDE_ID: u32 = 256;

/// A presentation document opened from, or saved to, an OOXML container.
///
/// # Example
///
/// ```rust
/// use blockdeck::{Bounds, Element, Presentation, TextBody};
///
/// # fn main() -> blockdeck::Result<()> {
/// let mut deck = Presentation::with_blank_slide()?;
/// let text = TextBody::from_text("Hello, {{title.main}}");
/// deck.slide_mut(0)?
///     .insert_element(Element::text_box(Bounds::from_inches(1.0, 1.0, 8.0, 1.0), text));
///
/// let bytes = deck.save()?;
/// let reopened = Presentation::open(&bytes)?;
/// assert_eq!(reopened.slide_count(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Presentation {
    package: Package,
    presentation_part: String,
    presentation_rels: Relationships,
    slide_width: Emu,
    slide_height: Emu,
    slides: Vec<Slide>,
    layouts: Vec<Layout>,
    masters: Vec<Master>,
    /// Slides were added, removed or cloned since opening
    structure_modified: bool,
}

/// One page of a presentation
#[derive(Debug, Clone)]
pub struct Slide {
    part_name: String,
    slide_id: u32,
    rel_id: String,
    xml: String,
    rels: Relationships,
    elements: Vec<Element>,
    layout_part: Option<String>,
    modified: bool,
    rels_modified: bool,
}

/// A slide layout available for new slides
#[derive(Debug, Clone)]
pub struct Layout {
    part_name: String,
    name: String,
    layout_type: Option<String>,
    master: usize,
    placeholders: Vec<Element>,
}

#[derive(Debug, Clone)]
struct Master {
    placeholders: Vec<Element>,
}

/// A mutable slide together with the presentation's slide dimensions
#[derive(Debug)]
pub struct Canvas<'a> {
    slide: &'a mut Slide,
    width: Emu,
    height: Emu,
}

impl Presentation {
    /// Opens a presentation from the bytes of a `.pptx` container.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a zip container, a required part
    /// is missing, or a part is not well-formed XML.
    pub fn open(bytes: &[u8]) -> Result<Self> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    /// Opens a presentation file.
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::open(&bytes)
    }

    /// Creates an empty presentation with one master and a blank layout.
    pub fn new() -> Result<Self> {
        Self::from_package(Package::template()?)
    }

    /// Creates a presentation holding one blank slide.
    pub fn with_blank_slide() -> Result<Self> {
        let mut presentation = Self::new()?;
        presentation.add_blank_slide()?;
        Ok(presentation)
    }

    fn from_package(package: Package) -> Result<Self> {
        let root_rels = package.relationships("")?;
        let presentation_part = root_rels
            .first_of_type(REL_OFFICE_DOCUMENT)
            .map(|rel| resolve_target("", &rel.target))
            .unwrap_or_else(|| PRESENTATION_PART.to_string());
        let presentation_rels = package.relationships(&presentation_part)?;

        let xml = package.part_str(&presentation_part)?;
        let doc = Document::parse(xml)?;
        let root = doc.root_element();
        let size = child(root, NS_P, "sldSz");
        let slide_width = size
            .and_then(|n| attr_i64(n, "cx"))
            .unwrap_or(DEFAULT_SLIDE_WIDTH);
        let slide_height = size
            .and_then(|n| attr_i64(n, "cy"))
            .unwrap_or(DEFAULT_SLIDE_HEIGHT);

        let mut presentation = Self {
            presentation_part,
            presentation_rels,
            slide_width,
            slide_height,
            slides: Vec::new(),
            layouts: Vec::new(),
            masters: Vec::new(),
            structure_modified: false,
            package: package.clone(),
        };
        presentation.load_masters(&package, root)?;

        let slide_refs: Vec<(u32, String)> = child(root, NS_P, "sldIdLst")
            .map(|list| {
                children(list, NS_P, "sldId")
                    .filter_map(|n| Some((attr_u32(n, "id")?, n.attribute((NS_R, "id"))?.to_string())))
                    .collect()
            })
            .unwrap_or_default();
        for (slide_id, rel_id) in slide_refs {
            let rel = presentation.presentation_rels.get(&rel_id).ok_or_else(|| {
                DeckError::InvalidStructure(format!("slide relationship {rel_id} not found"))
            })?;
            let part_name = resolve_target(&presentation.presentation_part, &rel.target);
            let slide = presentation.load_slide(&package, part_name, slide_id, rel_id)?;
            presentation.slides.push(slide);
        }

        tracing::debug!(
            "Opened presentation with {} slides and {} layouts",
            presentation.slides.len(),
            presentation.layouts.len()
        );
        Ok(presentation)
    }

    fn load_masters(&mut self, package: &Package, root: Node) -> Result<()> {
        let master_rel_ids: Vec<String> = child(root, NS_P, "sldMasterIdLst")
            .map(|list| {
                children(list, NS_P, "sldMasterId")
                    .filter_map(|n| n.attribute((NS_R, "id")).map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        let master_parts: Vec<String> = if master_rel_ids.is_empty() {
            self.presentation_rels
                .of_type(REL_SLIDE_MASTER)
                .map(|rel| resolve_target(&self.presentation_part, &rel.target))
                .collect()
        } else {
            master_rel_ids
                .iter()
                .filter_map(|id| self.presentation_rels.get(id))
                .map(|rel| resolve_target(&self.presentation_part, &rel.target))
                .collect()
        };

        for master_part in master_parts {
            let xml = package.part_str(&master_part)?;
            let master_index = self.masters.len();
            self.masters.push(Master {
                placeholders: placeholders_of(read_elements(xml)?),
            });

            let master_rels = package.relationships(&master_part)?;
            let doc = Document::parse(xml)?;
            let layout_rel_ids: Vec<String> = child(doc.root_element(), NS_P, "sldLayoutIdLst")
                .map(|list| {
                    children(list, NS_P, "sldLayoutId")
                        .filter_map(|n| n.attribute((NS_R, "id")).map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();
            for rel_id in layout_rel_ids {
                let Some(rel) = master_rels.get(&rel_id) else {
                    tracing::warn!("Layout relationship {} of {} not found", rel_id, master_part);
                    continue;
                };
                let part_name = resolve_target(&master_part, &rel.target);
                let layout = self.load_layout(package, part_name, master_index)?;
                self.layouts.push(layout);
            }
        }
        Ok(())
    }

    fn load_layout(&self, package: &Package, part_name: String, master: usize) -> Result<Layout> {
        let xml = package.part_str(&part_name)?;
        let doc = Document::parse(xml)?;
        let root = doc.root_element();
        let mut placeholders = placeholders_of(read_elements(xml)?);
        inherit_bounds(&mut placeholders, None, Some(&self.masters[master].placeholders));
        Ok(Layout {
            name: child(root, NS_P, "cSld")
                .and_then(|c| c.attribute("name"))
                .unwrap_or_default()
                .to_string(),
            layout_type: root.attribute("type").map(str::to_string),
            part_name,
            master,
            placeholders,
        })
    }

    fn load_slide(
        &self,
        package: &Package,
        part_name: String,
        slide_id: u32,
        rel_id: String,
    ) -> Result<Slide> {
        let xml = package.part_str(&part_name)?.to_string();
        let rels = package.relationships(&part_name)?;
        let layout_part = rels
            .first_of_type(REL_SLIDE_LAYOUT)
            .map(|rel| resolve_target(&part_name, &rel.target));
        let mut elements = read_elements(&xml)?;

        let layout = layout_part
            .as_deref()
            .and_then(|part| self.layouts.iter().find(|l| l.part_name == part));
        inherit_bounds(
            &mut elements,
            layout.map(|l| l.placeholders.as_slice()),
            layout.map(|l| self.masters[l.master].placeholders.as_slice()),
        );

        Ok(Slide {
            part_name,
            slide_id,
            rel_id,
            xml,
            rels,
            elements,
            layout_part,
            modified: false,
            rels_modified: false,
        })
    }

    /// Serializes the presentation into `.pptx` bytes.
    ///
    /// Unmodified slides are written back exactly as read.
    ///
    /// # Errors
    ///
    /// Returns an error if a modified part can no longer be parsed or the
    /// container cannot be written.
    pub fn save(&self) -> Result<Vec<u8>> {
        let mut package = self.package.clone();

        for slide in &self.slides {
            if slide.modified {
                let xml = splice_shape_tree(&slide.xml, &slide.elements)?;
                package.set_part(slide.part_name.clone(), xml.into_bytes());
            }
            if slide.rels_modified {
                package.set_relationships(&slide.part_name, &slide.rels);
            }
        }

        if self.structure_modified {
            package.set_relationships(&self.presentation_part, &self.presentation_rels);
            let xml = self.splice_slide_list(package.part_str(&self.presentation_part)?)?;
            package.set_part(self.presentation_part.clone(), xml.into_bytes());

            let stale: Vec<String> = package
                .content_types()
                .parts_of_type(CT_SLIDE)
                .map(str::to_string)
                .collect();
            let types = package.content_types_mut();
            for part in stale {
                types.remove_override(&part);
            }
            for slide in &self.slides {
                types.set_override(&slide.part_name, CT_SLIDE);
            }
        }

        let bytes = package.to_bytes()?;
        tracing::info!(
            "Saved presentation: {} slides, {} bytes",
            self.slides.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Saves the presentation to a file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.save()?)?;
        Ok(())
    }

    /// Rewrite `p:sldIdLst` of the presentation part from the current slides
    fn splice_slide_list(&self, xml: &str) -> Result<String> {
        let doc = Document::parse(xml)?;
        let root = doc.root_element();

        let list = if self.slides.is_empty() {
            String::new()
        } else {
            let mut list = String::from("<p:sldIdLst>");
            for slide in &self.slides {
                list.push_str(&format!(
                    "<p:sldId id=\"{}\" r:id=\"{}\"/>",
                    slide.slide_id, slide.rel_id
                ));
            }
            list.push_str("</p:sldIdLst>");
            list
        };

        let (start, end) = match child(root, NS_P, "sldIdLst") {
            Some(existing) => (existing.range().start, existing.range().end),
            None => {
                let before = ["sldMasterIdLst", "notesMasterIdLst", "handoutMasterIdLst"];
                let at = root
                    .children()
                    .filter(|n| before.iter().any(|name| is(*n, NS_P, name)))
                    .map(|n| n.range().end)
                    .max()
                    .or_else(|| child(root, NS_P, "sldSz").map(|n| n.range().start))
                    .ok_or_else(|| {
                        DeckError::InvalidStructure("presentation part has no master list".into())
                    })?;
                (at, at)
            }
        };

        let mut out = String::with_capacity(xml.len() + list.len());
        out.push_str(&xml[..start]);
        out.push_str(&list);
        out.push_str(&xml[end..]);
        Ok(ensure_namespaces(&out))
    }

    /// Slide width and height in EMU
    pub fn slide_size(&self) -> (Emu, Emu) {
        (self.slide_width, self.slide_height)
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slide(&self, index: usize) -> Result<&Slide> {
        let count = self.slides.len();
        self.slides
            .get(index)
            .ok_or(DeckError::InvalidSlideIndex(index, count))
    }

    pub fn slide_mut(&mut self, index: usize) -> Result<&mut Slide> {
        let count = self.slides.len();
        self.slides
            .get_mut(index)
            .ok_or(DeckError::InvalidSlideIndex(index, count))
    }

    /// Mutable view of a slide with the presentation's dimensions
    pub fn canvas_mut(&mut self, index: usize) -> Result<Canvas<'_>> {
        let (width, height) = self.slide_size();
        Ok(Canvas {
            slide: self.slide_mut(index)?,
            width,
            height,
        })
    }

    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    /// Appends a slide based on the layout at `layout_index` and returns its index.
    ///
    /// Layout placeholders other than date, footer and slide number are cloned
    /// onto the new slide as empty placeholders.
    pub fn add_slide(&mut self, layout_index: usize) -> Result<usize> {
        let layout = self.layouts.get(layout_index).ok_or_else(|| {
            DeckError::InvalidStructure(format!(
                "layout index {layout_index} out of range ({} layouts)",
                self.layouts.len()
            ))
        })?;

        let part_name = self.package.next_part_name("ppt/slides/slide", "xml");
        let mut rels = Relationships::new();
        rels.add(REL_SLIDE_LAYOUT, &relative_target(&part_name, &layout.part_name));

        let mut slide = Slide {
            part_name: part_name.clone(),
            slide_id: self.next_slide_id(),
            rel_id: self
                .presentation_rels
                .add(REL_SLIDE, &relative_target(&self.presentation_part, &part_name)),
            xml: SLIDE_SKELETON.to_string(),
            rels,
            elements: Vec::new(),
            layout_part: Some(layout.part_name.clone()),
            modified: true,
            rels_modified: true,
        };
        for placeholder in &layout.placeholders {
            let Some(info) = placeholder.placeholder else {
                continue;
            };
            if info.kind.is_furniture() || !matches!(placeholder.body, ElementBody::Shape(_)) {
                continue;
            }
            let mut element = Element::new(
                placeholder.name.clone(),
                placeholder.bounds,
                ElementBody::Shape(Shape {
                    text: Some(TextBody::new()),
                    ..Shape::default()
                }),
            );
            element.placeholder = Some(info);
            element.inherited_bounds = Some(placeholder.bounds);
            slide.insert_element(element);
        }

        tracing::debug!("Added {} using layout {}", part_name, layout.part_name);
        // reserve the part name
        self.package.set_part(part_name, SLIDE_SKELETON.as_bytes().to_vec());
        self.slides.push(slide);
        self.structure_modified = true;
        Ok(self.slides.len() - 1)
    }

    /// Appends a slide using the layout of type `blank`, or the first layout.
    pub fn add_blank_slide(&mut self) -> Result<usize> {
        let index = self
            .layouts
            .iter()
            .position(|l| l.layout_type.as_deref() == Some("blank"))
            .unwrap_or(0);
        self.add_slide(index)
    }

    /// Removes a slide, its relationships and its notes slide.
    pub fn delete_slide(&mut self, index: usize) -> Result<()> {
        let count = self.slides.len();
        if index >= count {
            return Err(DeckError::InvalidSlideIndex(index, count));
        }
        let slide = self.slides.remove(index);
        self.presentation_rels.remove(&slide.rel_id);

        for rel in slide.rels.of_type(REL_NOTES_SLIDE) {
            let notes = resolve_target(&slide.part_name, &rel.target);
            self.package.remove_part(&rels_part_for(&notes));
            self.package.remove_part(&notes);
        }
        self.package.remove_part(&rels_part_for(&slide.part_name));
        self.package.remove_part(&slide.part_name);
        self.structure_modified = true;
        tracing::debug!("Deleted {}", slide.part_name);
        Ok(())
    }

    /// Appends a copy of the slide at `index` and returns the new index.
    ///
    /// The copy shares the source's layout and media; notes are not copied.
    pub fn clone_slide(&mut self, index: usize) -> Result<usize> {
        let source = self.slide(index)?.clone();
        let part_name = self.package.next_part_name("ppt/slides/slide", "xml");

        let mut rels = Relationships::new();
        for rel in source.rels.iter() {
            if rel.rel_type == REL_NOTES_SLIDE {
                continue;
            }
            let mut rel = rel.clone();
            if !rel.external {
                let resolved = resolve_target(&source.part_name, &rel.target);
                rel.target = relative_target(&part_name, &resolved);
            }
            rels.push(rel);
        }

        let slide = Slide {
            part_name: part_name.clone(),
            slide_id: self.next_slide_id(),
            rel_id: self
                .presentation_rels
                .add(REL_SLIDE, &relative_target(&self.presentation_part, &part_name)),
            xml: source.xml,
            rels,
            elements: source.elements,
            layout_part: source.layout_part,
            modified: true,
            rels_modified: true,
        };
        self.package.set_part(part_name, slide.xml.clone().into_bytes());
        self.slides.push(slide);
        self.structure_modified = true;
        Ok(self.slides.len() - 1)
    }

    fn next_slide_id(&self) -> u32 {
        self.slides
            .iter()
            .map(|s| s.slide_id + 1)
            .max()
            .unwrap_or(MIN_SLIDE_ID)
            .max(MIN_SLIDE_ID)
    }

    /// Stores image bytes as a new media part and returns the part name.
    ///
    /// # Errors
    ///
    /// Returns an error if the image format cannot be recognised.
    pub fn add_media(&mut self, bytes: &[u8]) -> Result<String> {
        let format = image::guess_format(bytes)?;
        let extension = format.extensions_str().first().copied().unwrap_or("bin");
        if !self.package.content_types().has_default(extension) {
            self.package
                .content_types_mut()
                .add_default(extension, format.to_mime_type());
        }
        let part_name = self.package.next_part_name("ppt/media/image", extension);
        self.package.set_part(part_name.clone(), bytes.to_vec());
        Ok(part_name)
    }

    /// Adds a picture to a slide and returns its element id.
    pub fn add_picture(&mut self, slide_index: usize, bytes: &[u8], bounds: Bounds) -> Result<u32> {
        self.slide(slide_index)?;
        let media = self.add_media(bytes)?;
        let slide = self.slide_mut(slide_index)?;
        let embed = slide
            .rels
            .add(REL_IMAGE, &relative_target(&slide.part_name, &media));
        slide.rels_modified = true;
        Ok(slide.insert_element(Element::picture(bounds, embed)))
    }

    /// Bytes of the image a slide refers to through `rel_id`
    pub fn slide_image(&self, slide_index: usize, rel_id: &str) -> Result<&[u8]> {
        let slide = self.slide(slide_index)?;
        let rel = slide
            .rels
            .get(rel_id)
            .ok_or_else(|| DeckError::MissingPart(format!("{} {rel_id}", slide.part_name)))?;
        let part = resolve_target(&slide.part_name, &rel.target);
        self.package
            .part(&part)
            .ok_or(DeckError::MissingPart(part))
    }
}

/// Placeholder elements of a layout or master
fn placeholders_of(elements: Vec<Element>) -> Vec<Element> {
    elements
        .into_iter()
        .filter(|e| e.placeholder.is_some())
        .collect()
}

/// Placeholder type a master uses for a slide or layout placeholder
fn master_type(kind: PlaceholderType) -> PlaceholderType {
    match kind {
        PlaceholderType::CenterTitle => PlaceholderType::Title,
        PlaceholderType::Subtitle
        | PlaceholderType::Object
        | PlaceholderType::Chart
        | PlaceholderType::Table
        | PlaceholderType::ClipArt
        | PlaceholderType::Diagram
        | PlaceholderType::Media
        | PlaceholderType::Picture => PlaceholderType::Body,
        other => other,
    }
}

/// Give placeholders without a transform the bounds of their layout
/// placeholder (by idx, then type), else of the master placeholder.
fn inherit_bounds(
    elements: &mut [Element],
    layout: Option<&[Element]>,
    master: Option<&[Element]>,
) {
    for element in elements.iter_mut() {
        let (Some(info), Some(_)) = (element.placeholder, element.inherited_bounds) else {
            continue;
        };
        let from_layout = layout.and_then(|candidates| {
            let with_bounds = || candidates.iter().filter(|c| !c.bounds.is_empty());
            info.idx
                .and_then(|idx| {
                    with_bounds().find(|c| c.placeholder.and_then(|p| p.idx) == Some(idx))
                })
                .or_else(|| with_bounds().find(|c| c.placeholder.map(|p| p.kind) == Some(info.kind)))
        });
        let found = from_layout.or_else(|| {
            master.and_then(|candidates| {
                candidates.iter().filter(|c| !c.bounds.is_empty()).find(|c| {
                    c.placeholder.map(|p| master_type(p.kind)) == Some(master_type(info.kind))
                })
            })
        });
        if let Some(source) = found {
            element.bounds = source.bounds;
            element.inherited_bounds = Some(source.bounds);
        }
    }
}

impl Slide {
    pub fn part_name(&self) -> &str {
        &self.part_name
    }

    pub fn layout_part(&self) -> Option<&str> {
        self.layout_part.as_deref()
    }

    pub fn relationships(&self) -> &Relationships {
        &self.rels
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    /// Mutable access to an element; it is regenerated on save
    pub fn element_mut(&mut self, index: usize) -> Option<&mut Element> {
        let element = self.elements.get_mut(index)?;
        element.touch();
        self.modified = true;
        Some(element)
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Id one past the highest element id on the slide (the tree itself is 1)
    pub fn next_element_id(&self) -> u32 {
        self.elements.iter().map(|e| e.id).max().unwrap_or(1).max(1) + 1
    }

    /// Appends an element, assigning it a fresh id, and returns that id
    pub fn insert_element(&mut self, mut element: Element) -> u32 {
        element.id = self.next_element_id();
        element.raw = None;
        let id = element.id;
        self.elements.push(element);
        self.modified = true;
        id
    }

    /// Removes the elements at `indices` and returns how many were removed
    pub fn remove_elements(&mut self, indices: &BTreeSet<usize>) -> usize {
        let before = self.elements.len();
        let mut index = 0;
        self.elements.retain(|_| {
            let keep = !indices.contains(&index);
            index += 1;
            keep
        });
        let removed = before - self.elements.len();
        if removed > 0 {
            self.modified = true;
        }
        removed
    }
}

impl Layout {
    pub fn part_name(&self) -> &str {
        &self.part_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `p:sldLayout/@type`, e.g. `blank` or `title`
    pub fn layout_type(&self) -> Option<&str> {
        self.layout_type.as_deref()
    }

    pub fn placeholders(&self) -> &[Element] {
        &self.placeholders
    }
}

impl Canvas<'_> {
    pub fn width(&self) -> Emu {
        self.width
    }

    pub fn height(&self) -> Emu {
        self.height
    }

    pub fn width_inches(&self) -> f64 {
        emu_to_inches(self.width)
    }

    pub fn height_inches(&self) -> f64 {
        emu_to_inches(self.height)
    }
}

impl Deref for Canvas<'_> {
    type Target = Slide;

    fn deref(&self) -> &Slide {
        self.slide
    }
}

impl DerefMut for Canvas<'_> {
    fn deref_mut(&mut self) -> &mut Slide {
        self.slide
    }
}
