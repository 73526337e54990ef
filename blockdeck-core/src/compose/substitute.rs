//! In-place value substitution of `{{key}}` tokens

use std::collections::HashMap;

use serde::Serialize;

use crate::document::{Presentation, Slide};
use crate::model::{Element, ElementBody, TextBody};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubstitutionReport {
    /// Occurrences replaced
    pub replacements: usize,
    pub elements_touched: usize,
}

/// Replaces every `{{key}}` on a slide with its value, run by run.
///
/// Run styling is preserved. A token split across runs is left as is.
/// Returns `false` if `slide_index` does not exist.
pub fn replace_tokens(
    presentation: &mut Presentation,
    slide_index: usize,
    values: &HashMap<String, String>,
) -> bool {
    match presentation.slide_mut(slide_index) {
        Ok(slide) => {
            let report = replace_tokens_report(slide, values);
            tracing::info!(
                "Replaced {} tokens in {} elements of slide {}",
                report.replacements,
                report.elements_touched,
                slide_index
            );
            true
        }
        Err(e) => {
            tracing::error!("Error replacing tokens: {}", e);
            false
        }
    }
}

pub fn replace_tokens_report(
    slide: &mut Slide,
    values: &HashMap<String, String>,
) -> SubstitutionReport {
    let patterns: Vec<(String, &str)> = values
        .iter()
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (format!("{{{{{key}}}}}"), value.as_str()))
        .collect();

    // Only matching elements are borrowed mutably, so the rest keep their markup
    let matching: Vec<usize> = slide
        .elements()
        .iter()
        .enumerate()
        .filter(|(_, element)| element_contains_any(element, &patterns))
        .map(|(index, _)| index)
        .collect();

    let mut report = SubstitutionReport::default();
    for index in matching {
        if let Some(element) = slide.element_mut(index) {
            let replaced = replace_in_element(element, &patterns);
            tracing::debug!("Element {} '{}': {} replacements", index, element.name, replaced);
            report.replacements += replaced;
            report.elements_touched += 1;
        }
    }
    report
}

fn text_bodies(element: &Element) -> Vec<&TextBody> {
    match &element.body {
        ElementBody::Shape(shape) => shape.text.iter().collect(),
        ElementBody::Table(table) => table
            .rows
            .iter()
            .flat_map(|row| row.cells.iter().map(|cell| &cell.text))
            .collect(),
        _ => Vec::new(),
    }
}

fn element_contains_any(element: &Element, patterns: &[(String, &str)]) -> bool {
    text_bodies(element).into_iter().any(|body| {
        body.paragraphs
            .iter()
            .flat_map(|paragraph| paragraph.text_runs())
            .any(|run| patterns.iter().any(|(token, _)| run.text.contains(token.as_str())))
    })
}

fn replace_in_element(element: &mut Element, patterns: &[(String, &str)]) -> usize {
    match &mut element.body {
        ElementBody::Shape(shape) => shape
            .text
            .as_mut()
            .map(|body| replace_in_body(body, patterns))
            .unwrap_or(0),
        ElementBody::Table(table) => table
            .rows
            .iter_mut()
            .flat_map(|row| row.cells.iter_mut())
            .map(|cell| replace_in_body(&mut cell.text, patterns))
            .sum(),
        _ => 0,
    }
}

fn replace_in_body(body: &mut TextBody, patterns: &[(String, &str)]) -> usize {
    let mut replaced = 0;
    for paragraph in &mut body.paragraphs {
        let before = replaced;
        for run in paragraph.text_runs_mut() {
            for (token, value) in patterns {
                let count = run.text.matches(token.as_str()).count();
                if count > 0 {
                    run.text = run.text.replace(token.as_str(), value);
                    replaced += count;
                }
            }
        }
        // multi-line values become soft line breaks
        if replaced > before {
            paragraph.split_line_breaks();
        }
    }
    replaced
}
