//! Namespace constants and small roxmltree helpers shared by the readers

use std::borrow::Cow;

use roxmltree::Node;

pub const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
pub const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

pub const URI_TABLE: &str = "http://schemas.openxmlformats.org/drawingml/2006/table";
pub const URI_CHART: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";

pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const REL_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
pub const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
pub const REL_THEME: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
pub const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub const REL_NOTES_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
pub const REL_CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";

pub const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
pub const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
pub const CT_XML: &str = "application/xml";

/// First child element with the given namespace and local name
pub fn child<'a, 'input>(node: Node<'a, 'input>, ns: &str, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is(*n, ns, name))
}

pub fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    ns: &'a str,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| is(*n, ns, name))
}

/// First descendant element (excluding `node` itself)
pub fn descendant<'a, 'input>(
    node: Node<'a, 'input>,
    ns: &str,
    name: &str,
) -> Option<Node<'a, 'input>> {
    node.descendants().skip(1).find(|n| is(*n, ns, name))
}

pub fn is(node: Node, ns: &str, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(ns)
}

pub fn attr_i64(node: Node, name: &str) -> Option<i64> {
    node.attribute(name).and_then(|v| v.trim().parse().ok())
}

pub fn attr_u32(node: Node, name: &str) -> Option<u32> {
    node.attribute(name).and_then(|v| v.trim().parse().ok())
}

/// OOXML boolean attribute: `1`/`true` or `0`/`false`
pub fn attr_bool(node: Node, name: &str) -> Option<bool> {
    match node.attribute(name)? {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Markup of `node` exactly as written in `source`
pub fn raw<'s>(source: &'s str, node: Node) -> &'s str {
    &source[node.range()]
}

/// Escape text content and attribute values.
///
/// Characters XML 1.0 does not allow are written as `_xHHHH_`, the OOXML
/// escape for them; `\r` becomes a character reference so it survives parsing.
pub fn escape(text: &str) -> Cow<'_, str> {
    let needs_escape =
        |c: char| matches!(c, '&' | '<' | '>' | '"' | '\'' | '\r') || !is_xml_char(c);
    if !text.contains(needs_escape) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\r' => escaped.push_str("&#xD;"),
            c if !is_xml_char(c) => escaped.push_str(&format!("_x{:04X}_", u32::from(c))),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

fn is_xml_char(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => true,
        '\u{0}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}' => false,
        _ => true,
    }
}

/// Make sure the root start tag of `xml` declares the `p`, `a` and `r`
/// prefixes used by generated markup.
pub fn ensure_namespaces(xml: &str) -> String {
    let Some(start) = root_start_tag(xml) else {
        return xml.to_string();
    };
    let tag = &xml[start.0..start.1];
    let mut missing = String::new();
    for (prefix, ns) in [("p", NS_P), ("a", NS_A), ("r", NS_R)] {
        if !tag.contains(&format!("xmlns:{prefix}=")) {
            missing.push_str(&format!(" xmlns:{prefix}=\"{ns}\""));
        }
    }
    if missing.is_empty() {
        return xml.to_string();
    }
    let insert_at = if tag.ends_with("/>") {
        start.1 - 2
    } else {
        start.1 - 1
    };
    let mut out = String::with_capacity(xml.len() + missing.len());
    out.push_str(&xml[..insert_at]);
    out.push_str(&missing);
    out.push_str(&xml[insert_at..]);
    out
}

/// Byte range of the root element's start tag
fn root_start_tag(xml: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    while let Some(pos) = xml[offset..].find('<') {
        let begin = offset + pos;
        let rest = &xml[begin + 1..];
        if rest.starts_with('?') || rest.starts_with('!') {
            offset = begin + 1;
            continue;
        }
        let mut quote = None;
        for (i, ch) in xml[begin..].char_indices() {
            match (quote, ch) {
                (None, '"') | (None, '\'') => quote = Some(ch),
                (Some(q), c) if c == q => quote = None,
                (None, '>') => return Some((begin, begin + i + 1)),
                _ => {}
            }
        }
        return None;
    }
    None
}
