//! Canvas cleanup before a layout pass

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::extract::tokens::contains_token_markers;
use crate::model::{Element, ElementKind, Fill, Rgb};

/// Predicate for stray template artifacts that a layout pass removes
pub trait ArtifactFilter: Send + Sync {
    fn is_artifact(&self, element: &Element) -> bool;
}

impl<F> ArtifactFilter for F
where
    F: Fn(&Element) -> bool + Send + Sync,
{
    fn is_artifact(&self, element: &Element) -> bool {
        self(element)
    }
}

/// Text-less auto-shape with a solid, predominantly red fill
#[derive(Debug, Clone, Copy, Default)]
pub struct RedFillArtifact;

impl RedFillArtifact {
    pub fn is_red(color: Rgb) -> bool {
        color.r > 200 && color.g < 100 && color.b < 100
    }
}

impl ArtifactFilter for RedFillArtifact {
    fn is_artifact(&self, element: &Element) -> bool {
        if element.kind() != ElementKind::AutoShape {
            return false;
        }
        let Some(shape) = element.shape() else {
            return false;
        };
        let red = shape
            .fill
            .as_ref()
            .and_then(Fill::solid_rgb)
            .is_some_and(Self::is_red);
        let has_text = shape.text.as_ref().is_some_and(|text| !text.is_blank());
        red && !has_text
    }
}

#[derive(Clone)]
pub struct CleanupOptions {
    /// Remove every free-floating text box
    pub remove_text_boxes: bool,
    /// Remove elements whose text still holds `{{` and `}}`
    pub remove_token_markers: bool,
    /// Remove native body and object placeholders
    pub remove_content_placeholders: bool,
    /// `None` disables artifact removal
    pub artifact_filter: Option<Arc<dyn ArtifactFilter>>,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            remove_text_boxes: true,
            remove_token_markers: true,
            remove_content_placeholders: true,
            artifact_filter: Some(Arc::new(RedFillArtifact)),
        }
    }
}

impl fmt::Debug for CleanupOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanupOptions")
            .field("remove_text_boxes", &self.remove_text_boxes)
            .field("remove_token_markers", &self.remove_token_markers)
            .field("remove_content_placeholders", &self.remove_content_placeholders)
            .field("artifact_filter", &self.artifact_filter.is_some())
            .finish()
    }
}

impl CleanupOptions {
    pub fn with_artifact_filter(mut self, filter: impl ArtifactFilter + 'static) -> Self {
        self.artifact_filter = Some(Arc::new(filter));
        self
    }

    pub fn without_artifact_filter(mut self) -> Self {
        self.artifact_filter = None;
        self
    }
}

/// Indices of the elements a layout pass removes, computed before any removal
pub fn removal_set(elements: &[Element], options: &CleanupOptions) -> BTreeSet<usize> {
    elements
        .iter()
        .enumerate()
        .filter(|(index, element)| {
            let reason = removal_reason(element, options);
            if let Some(reason) = reason {
                tracing::debug!("Marking element {} '{}' for removal: {}", index, element.name, reason);
            }
            reason.is_some()
        })
        .map(|(index, _)| index)
        .collect()
}

fn removal_reason(element: &Element, options: &CleanupOptions) -> Option<&'static str> {
    let kind = element.kind();
    if options.remove_text_boxes && kind == ElementKind::Text {
        return Some("text box");
    }
    if options.remove_token_markers
        && element.text().is_some_and(|text| contains_token_markers(&text))
    {
        return Some("unsubstituted token");
    }
    if options.remove_content_placeholders
        && element.placeholder.is_some_and(|ph| ph.kind.is_content())
    {
        return Some("content placeholder");
    }
    if let Some(filter) = &options.artifact_filter {
        if filter.is_artifact(element) {
            tracing::warn!("Removing template artifact '{}'", element.name);
            return Some("artifact");
        }
    }
    None
}
