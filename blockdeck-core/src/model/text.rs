//! Text bodies: paragraphs, runs and run formatting

use std::borrow::Cow;
use std::fmt;

/// Paragraph alignment (`a:pPr/@algn`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
    Distributed,
}

impl Alignment {
    pub fn from_ooxml(value: &str) -> Option<Self> {
        match value {
            "l" => Some(Alignment::Left),
            "ctr" => Some(Alignment::Center),
            "r" => Some(Alignment::Right),
            "just" | "justLow" => Some(Alignment::Justify),
            "dist" | "thaiDist" => Some(Alignment::Distributed),
            _ => None,
        }
    }

    pub fn ooxml(&self) -> &'static str {
        match self {
            Alignment::Left => "l",
            Alignment::Center => "ctr",
            Alignment::Right => "r",
            Alignment::Justify => "just",
            Alignment::Distributed => "dist",
        }
    }

    /// Upper-case name used in style metadata
    pub fn name(&self) -> &'static str {
        match self {
            Alignment::Left => "LEFT",
            Alignment::Center => "CENTER",
            Alignment::Right => "RIGHT",
            Alignment::Justify => "JUSTIFY",
            Alignment::Distributed => "DISTRIBUTE",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A direct sRGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `RRGGBB` or `#RRGGBB`
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    /// `#rrggbb`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// `RRGGBB` as written in `a:srgbClr/@val`
    pub fn ooxml(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Colour of a run or fill, by colour mode
#[derive(Debug, Clone, PartialEq)]
pub enum ColorValue {
    /// `a:srgbClr`
    Rgb(Rgb),
    /// `a:schemeClr`, resolved through the theme
    Scheme(String),
    /// Any other colour mode, kept as raw markup
    Other(String),
}

impl ColorValue {
    pub fn rgb(&self) -> Option<Rgb> {
        match self {
            ColorValue::Rgb(rgb) => Some(*rgb),
            _ => None,
        }
    }
}

/// Run-level character properties (`a:rPr`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunProps {
    /// Latin typeface
    pub font: Option<String>,
    /// Size in points
    pub size: Option<f64>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub color: Option<ColorValue>,
    /// Unqualified attributes not modelled above (`lang`, `u`, `spc`, ...)
    pub(crate) extra_attrs: Vec<(String, String)>,
    /// Child elements not modelled above, as `(local name, markup)`
    pub(crate) extra: Vec<(String, String)>,
}

impl RunProps {
    pub fn is_empty(&self) -> bool {
        self.font.is_none()
            && self.size.is_none()
            && self.bold.is_none()
            && self.italic.is_none()
            && self.color.is_none()
            && self.extra_attrs.is_empty()
            && self.extra.is_empty()
    }

    /// Font, size, weight, slant and colour only; safe to carry into another document
    pub fn portable(&self) -> RunProps {
        RunProps {
            font: self.font.clone(),
            size: self.size,
            bold: self.bold,
            italic: self.italic,
            color: self.color.clone(),
            ..RunProps::default()
        }
    }
}

/// `\r`, `\n` and the vertical tab PowerPoint uses for a soft line break
const LINE_BREAKS: [char; 3] = ['\r', '\n', '\u{b}'];

/// `\r\n` and lone `\r` become `\n`
pub fn normalize_newlines(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Text that PowerPoint recomputes on display (`a:fld`), such as the slide number
#[derive(Debug, Clone, PartialEq)]
pub struct TextField {
    /// `{GUID}` identifying the field within the document
    pub id: String,
    /// `slidenum`, `datetime1`, ...
    pub kind: Option<String>,
}

/// A run of uniformly formatted text, or a line break
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    pub text: String,
    pub props: RunProps,
    pub line_break: bool,
    /// Set when the run is a field; its text is the last rendered value
    pub field: Option<TextField>,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            props: RunProps::default(),
            line_break: false,
            field: None,
        }
    }

    pub fn with_props(text: impl Into<String>, props: RunProps) -> Self {
        Self {
            text: text.into(),
            props,
            line_break: false,
            field: None,
        }
    }

    pub fn line_break() -> Self {
        Self {
            text: String::new(),
            props: RunProps::default(),
            line_break: true,
            field: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub alignment: Option<Alignment>,
    pub level: Option<u32>,
    pub runs: Vec<Run>,
    pub(crate) p_pr_attrs: Vec<(String, String)>,
    /// `a:pPr` children (bullets, spacing), raw
    pub(crate) p_pr_children: Vec<String>,
    /// `a:endParaRPr`, raw
    pub(crate) end_props: Option<String>,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_props(text, RunProps::default())
    }

    /// One paragraph of `text` in `props`; `\n` and vertical tabs become line breaks
    pub fn with_props(text: impl Into<String>, props: RunProps) -> Self {
        let text = text.into();
        let mut paragraph = Self::default();
        if !text.is_empty() {
            paragraph.runs.push(Run::with_props(text, props));
            paragraph.split_line_breaks();
        }
        paragraph
    }

    /// Split text runs at `\r\n`, `\r`, `\n` and vertical tabs into runs
    /// separated by `a:br`. Field runs are left alone.
    pub fn split_line_breaks(&mut self) {
        let splits = |run: &Run| {
            !run.line_break && run.field.is_none() && run.text.contains(LINE_BREAKS)
        };
        if !self.runs.iter().any(splits) {
            return;
        }
        let mut runs = Vec::with_capacity(self.runs.len() + 2);
        for run in std::mem::take(&mut self.runs) {
            if !splits(&run) {
                runs.push(run);
                continue;
            }
            let text = normalize_newlines(&run.text);
            for (i, piece) in text.split(['\n', '\u{b}']).enumerate() {
                if i > 0 {
                    runs.push(Run {
                        props: run.props.clone(),
                        ..Run::line_break()
                    });
                }
                if !piece.is_empty() {
                    runs.push(Run::with_props(piece, run.props.clone()));
                }
            }
        }
        self.runs = runs;
    }

    /// Text of the paragraph; line breaks become `\n`
    pub fn text(&self) -> String {
        self.runs
            .iter()
            .map(|run| if run.line_break { "\n" } else { run.text.as_str() })
            .collect()
    }

    /// Runs that carry text (line breaks excluded)
    pub fn text_runs(&self) -> impl Iterator<Item = &Run> {
        self.runs.iter().filter(|run| !run.line_break)
    }

    pub fn text_runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.runs.iter_mut().filter(|run| !run.line_break)
    }
}

/// Text frame content of a shape or table cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBody {
    pub paragraphs: Vec<Paragraph>,
    pub word_wrap: Option<bool>,
    /// Original `a:bodyPr` markup, re-emitted while `word_wrap` is untouched
    pub(crate) body_pr: Option<String>,
    pub(crate) list_style: Option<String>,
}

impl TextBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a body from text, one paragraph per `\n`-separated line
    pub fn from_text(text: &str) -> Self {
        let mut body = Self::new();
        body.set_text(text);
        body
    }

    /// Full text, paragraphs joined by `\n`
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace all content with `text`, one unformatted paragraph per line.
    /// A vertical tab is a line break within its paragraph.
    pub fn set_text(&mut self, text: &str) {
        self.paragraphs = normalize_newlines(text)
            .split('\n')
            .map(Paragraph::new)
            .collect();
    }

    pub fn set_word_wrap(&mut self, wrap: bool) {
        self.word_wrap = Some(wrap);
        self.body_pr = None;
    }

    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
    }

    pub fn first_paragraph(&self) -> Option<&Paragraph> {
        self.paragraphs.first()
    }
}
