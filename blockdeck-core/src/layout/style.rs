//! Field styles and their defaults

use serde::{Deserialize, Serialize};

use crate::extract::StyleMetadata;
use crate::model::{Alignment, ColorValue, Rgb, RunProps};

pub const DEFAULT_FONT: &str = "Arial";
pub const DEFAULT_FONT_SIZE: f64 = 18.0;
pub const DEFAULT_COLOR: &str = "#000000";

/// Font size as supplied by a caller: a number, or text that is not one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeValue {
    Points(f64),
    Text(String),
}

impl From<f64> for SizeValue {
    fn from(points: f64) -> Self {
        SizeValue::Points(points)
    }
}

/// Partial style of a field; unset members fall back to defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeValue>,
    /// `#rrggbb`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    /// `LEFT`, `CENTER`, `RIGHT`, `JUSTIFY` or `DISTRIBUTE`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,
}

impl FieldStyle {
    /// Members of `self`, with unset or empty ones taken from `fallback`
    pub fn or(&self, fallback: &FieldStyle) -> FieldStyle {
        fn pick<T: Clone>(value: &Option<T>, fallback: &Option<T>) -> Option<T> {
            value.clone().or_else(|| fallback.clone())
        }
        let non_empty = |value: &Option<String>| value.clone().filter(|s| !s.trim().is_empty());
        FieldStyle {
            name: non_empty(&self.name).or_else(|| non_empty(&fallback.name)),
            size: pick(&self.size, &fallback.size),
            color: non_empty(&self.color).or_else(|| non_empty(&fallback.color)),
            bold: pick(&self.bold, &fallback.bold),
            italic: pick(&self.italic, &fallback.italic),
            alignment: non_empty(&self.alignment).or_else(|| non_empty(&fallback.alignment)),
        }
    }
}

impl From<&StyleMetadata> for FieldStyle {
    fn from(metadata: &StyleMetadata) -> Self {
        let font = metadata.font.clone().unwrap_or_default();
        FieldStyle {
            name: font.name,
            size: font.size.map(SizeValue::Points),
            color: font.color,
            bold: font.bold,
            italic: font.italic,
            alignment: metadata.alignment.clone(),
        }
    }
}

/// Fully resolved style applied to a laid-out field
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font: String,
    /// Points
    pub size: f64,
    pub color: Rgb,
    pub bold: bool,
    pub italic: bool,
    pub alignment: Alignment,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: DEFAULT_FONT.to_string(),
            size: DEFAULT_FONT_SIZE,
            color: Rgb::BLACK,
            bold: false,
            italic: false,
            alignment: Alignment::Left,
        }
    }
}

impl TextStyle {
    pub fn run_props(&self) -> RunProps {
        RunProps {
            font: Some(self.font.clone()),
            size: Some(self.size),
            bold: Some(self.bold),
            italic: Some(self.italic),
            color: Some(ColorValue::Rgb(self.color)),
            ..RunProps::default()
        }
    }
}

/// Resolve a partial style against the built-in defaults.
///
/// Invalid members (non-numeric or non-positive size, malformed colour,
/// unknown alignment) are logged and replaced by their default.
pub fn resolve_style(style: &FieldStyle) -> TextStyle {
    let defaults = TextStyle::default();

    let size = match &style.size {
        None => defaults.size,
        Some(SizeValue::Points(points)) if points.is_finite() && *points > 0.0 => *points,
        Some(other) => {
            tracing::warn!("Invalid font size {:?}, using default {}", other, DEFAULT_FONT_SIZE);
            defaults.size
        }
    };

    let color = match style.color.as_deref().map(str::trim) {
        None | Some("") => defaults.color,
        Some(hex) => Rgb::from_hex(hex).unwrap_or_else(|| {
            tracing::warn!("Invalid font color {:?}, using default {}", hex, DEFAULT_COLOR);
            defaults.color
        }),
    };

    let alignment = match style.alignment.as_deref().map(str::trim) {
        None | Some("") => defaults.alignment,
        Some(name) => parse_alignment(name).unwrap_or_else(|| {
            tracing::warn!("Unknown alignment {:?}, using LEFT", name);
            defaults.alignment
        }),
    };

    TextStyle {
        font: style
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or(defaults.font),
        size,
        color,
        bold: style.bold.unwrap_or(defaults.bold),
        italic: style.italic.unwrap_or(defaults.italic),
        alignment,
    }
}

fn parse_alignment(name: &str) -> Option<Alignment> {
    match name.to_ascii_uppercase().as_str() {
        "LEFT" => Some(Alignment::Left),
        "CENTER" | "CENTRE" => Some(Alignment::Center),
        "RIGHT" => Some(Alignment::Right),
        "JUSTIFY" => Some(Alignment::Justify),
        "DISTRIBUTE" | "DISTRIBUTED" => Some(Alignment::Distributed),
        _ => None,
    }
}
