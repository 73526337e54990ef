//! Shape tree writer
//!
//! Pristine elements are emitted from their original markup; touched and new
//! elements are regenerated from the model.

use roxmltree::Document;

use super::element::{
    Element, ElementBody, Fill, Geometry, Picture, PlaceholderInfo, PlaceholderType, Shape,
    Table,
};
use super::reader::shape_tree;
use super::text::{ColorValue, Paragraph, Run, RunProps, TextBody};
use crate::error::Result;
use crate::geometry::Bounds;
use crate::package::xml::{ensure_namespaces, escape, is, NS_P, URI_TABLE};

/// Table style applied to generated tables ("Medium Style 2 - Accent 1")
const DEFAULT_TABLE_STYLE: &str = "{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}";

/// Replace the content of `p:spTree` in `slide_xml` with `elements`.
///
/// The tree's group properties and extension list are kept as written.
pub(crate) fn splice_shape_tree(slide_xml: &str, elements: &[Element]) -> Result<String> {
    let doc = Document::parse(slide_xml)?;
    let tree = shape_tree(&doc)?;
    let range = tree.range();
    let tree_xml = &slide_xml[range.clone()];

    let head_end = tree
        .children()
        .filter(|n| is(*n, NS_P, "nvGrpSpPr") || is(*n, NS_P, "grpSpPr"))
        .map(|n| n.range().end)
        .max()
        .unwrap_or_else(|| range.start + tree_xml.find('>').map_or(0, |i| i + 1));
    let tail: String = tree
        .children()
        .filter(|n| is(*n, NS_P, "extLst"))
        .map(|n| &slide_xml[n.range()])
        .collect();
    let qualified_name = tree_xml
        .trim_start_matches('<')
        .split(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .next()
        .unwrap_or("p:spTree");

    let mut out = String::with_capacity(slide_xml.len() + elements.len() * 256);
    out.push_str(&slide_xml[..head_end]);
    for element in elements {
        out.push_str(&write_element(element));
    }
    out.push_str(&tail);
    out.push_str(&format!("</{qualified_name}>"));
    out.push_str(&slide_xml[range.end..]);
    Ok(ensure_namespaces(&out))
}

/// Markup of one element
pub(crate) fn write_element(element: &Element) -> String {
    if let Some(raw) = &element.raw {
        return raw.clone();
    }
    match &element.body {
        ElementBody::Shape(shape) => write_shape(element, shape),
        ElementBody::Picture(picture) => write_picture(element, picture),
        ElementBody::Table(table) => write_table(element, table),
        ElementBody::Chart(chart) => chart.xml.clone(),
        ElementBody::Opaque(opaque) => opaque.xml.clone(),
    }
}

fn write_c_nv_pr(out: &mut String, element: &Element) {
    out.push_str(&format!(
        "<p:cNvPr id=\"{}\" name=\"{}\"",
        element.id,
        escape(&element.name)
    ));
    if let Some(descr) = &element.description {
        out.push_str(&format!(" descr=\"{}\"", escape(descr)));
    }
    out.push_str("/>");
}

fn write_nv_pr(out: &mut String, placeholder: Option<&PlaceholderInfo>) {
    match placeholder {
        Some(ph) => {
            out.push_str("<p:nvPr><p:ph");
            if ph.kind != PlaceholderType::Object {
                out.push_str(&format!(" type=\"{}\"", ph.kind.ooxml()));
            }
            if let Some(idx) = ph.idx {
                out.push_str(&format!(" idx=\"{idx}\""));
            }
            out.push_str("/></p:nvPr>");
        }
        None => out.push_str("<p:nvPr/>"),
    }
}

/// `<prefix:xfrm>` unless the element takes its bounds from the layout
fn write_xfrm(out: &mut String, element: &Element, prefix: &str) {
    if element.inherited_bounds == Some(element.bounds) {
        return;
    }
    let Bounds {
        left,
        top,
        width,
        height,
    } = element.bounds;
    out.push_str(&format!(
        "<{prefix}:xfrm><a:off x=\"{left}\" y=\"{top}\"/><a:ext cx=\"{width}\" cy=\"{height}\"/></{prefix}:xfrm>"
    ));
}

fn write_shape(element: &Element, shape: &Shape) -> String {
    let mut out = String::from("<p:sp><p:nvSpPr>");
    write_c_nv_pr(&mut out, element);
    out.push_str(if shape.text_box {
        "<p:cNvSpPr txBox=\"1\"/>"
    } else {
        "<p:cNvSpPr/>"
    });
    write_nv_pr(&mut out, element.placeholder.as_ref());
    out.push_str("</p:nvSpPr><p:spPr>");
    write_xfrm(&mut out, element, "a");
    match &shape.geometry {
        Some(Geometry::Preset(prst)) => {
            out.push_str(&format!(
                "<a:prstGeom prst=\"{}\"><a:avLst/></a:prstGeom>",
                escape(prst)
            ));
        }
        Some(Geometry::Custom(xml)) => out.push_str(xml),
        None => {}
    }
    if let Some(fill) = &shape.fill {
        write_fill(&mut out, fill);
    }
    for extra in &shape.sp_pr_extra {
        out.push_str(extra);
    }
    out.push_str("</p:spPr>");
    if let Some(style) = &shape.style {
        out.push_str(style);
    }
    if let Some(text) = &shape.text {
        write_text_body(&mut out, text, "p", shape.text_box);
    }
    out.push_str("</p:sp>");
    out
}

fn write_fill(out: &mut String, fill: &Fill) {
    match fill {
        Fill::NoFill => out.push_str("<a:noFill/>"),
        Fill::Solid(color) => {
            out.push_str("<a:solidFill>");
            write_color(out, color);
            out.push_str("</a:solidFill>");
        }
        Fill::Other(xml) => out.push_str(xml),
    }
}

fn write_color(out: &mut String, color: &ColorValue) {
    match color {
        ColorValue::Rgb(rgb) => {
            out.push_str(&format!("<a:srgbClr val=\"{}\"/>", rgb.ooxml()));
        }
        ColorValue::Scheme(name) => {
            out.push_str(&format!("<a:schemeClr val=\"{}\"/>", escape(name)));
        }
        ColorValue::Other(xml) => out.push_str(xml),
    }
}

/// `<prefix:txBody>`; text boxes get shape auto-fit on regenerated body properties
pub(crate) fn write_text_body(out: &mut String, body: &TextBody, prefix: &str, auto_fit: bool) {
    out.push_str(&format!("<{prefix}:txBody>"));
    match &body.body_pr {
        Some(raw) => out.push_str(raw),
        None => {
            out.push_str("<a:bodyPr");
            match body.word_wrap {
                Some(true) => out.push_str(" wrap=\"square\""),
                Some(false) => out.push_str(" wrap=\"none\""),
                None => {}
            }
            if auto_fit {
                out.push_str(" rtlCol=\"0\"><a:spAutoFit/></a:bodyPr>");
            } else {
                out.push_str("/>");
            }
        }
    }
    match &body.list_style {
        Some(raw) => out.push_str(raw),
        None => out.push_str("<a:lstStyle/>"),
    }
    if body.paragraphs.is_empty() {
        out.push_str("<a:p/>");
    }
    for paragraph in &body.paragraphs {
        write_paragraph(out, paragraph);
    }
    out.push_str(&format!("</{prefix}:txBody>"));
}

fn write_paragraph(out: &mut String, paragraph: &Paragraph) {
    out.push_str("<a:p>");
    let has_p_pr = paragraph.alignment.is_some()
        || paragraph.level.is_some()
        || !paragraph.p_pr_attrs.is_empty()
        || !paragraph.p_pr_children.is_empty();
    if has_p_pr {
        out.push_str("<a:pPr");
        for (name, value) in &paragraph.p_pr_attrs {
            out.push_str(&format!(" {name}=\"{}\"", escape(value)));
        }
        if let Some(level) = paragraph.level {
            out.push_str(&format!(" lvl=\"{level}\""));
        }
        if let Some(alignment) = paragraph.alignment {
            out.push_str(&format!(" algn=\"{}\"", alignment.ooxml()));
        }
        if paragraph.p_pr_children.is_empty() {
            out.push_str("/>");
        } else {
            out.push('>');
            for child in &paragraph.p_pr_children {
                out.push_str(child);
            }
            out.push_str("</a:pPr>");
        }
    }
    for run in &paragraph.runs {
        write_run(out, run);
    }
    if let Some(end) = &paragraph.end_props {
        out.push_str(end);
    }
    out.push_str("</a:p>");
}

fn write_run(out: &mut String, run: &Run) {
    if run.line_break {
        if run.props.is_empty() {
            out.push_str("<a:br/>");
        } else {
            out.push_str("<a:br>");
            write_run_props(out, &run.props);
            out.push_str("</a:br>");
        }
        return;
    }
    match &run.field {
        Some(field) => {
            out.push_str(&format!("<a:fld id=\"{}\"", escape(&field.id)));
            if let Some(kind) = &field.kind {
                out.push_str(&format!(" type=\"{}\"", escape(kind)));
            }
            out.push('>');
            write_run_props(out, &run.props);
            out.push_str(&format!("<a:t>{}</a:t></a:fld>", escape(&run.text)));
        }
        None => {
            out.push_str("<a:r>");
            write_run_props(out, &run.props);
            out.push_str(&format!("<a:t>{}</a:t></a:r>", escape(&run.text)));
        }
    }
}

/// Schema position of an `a:rPr` child; fill is 1, latin is 3
fn run_child_rank(name: &str) -> u8 {
    match name {
        "ln" => 0,
        "effectLst" | "effectDag" | "highlight" | "uLnTx" | "uLn" | "uFillTx" | "uFill" => 2,
        _ => 4,
    }
}

fn write_run_props(out: &mut String, props: &RunProps) {
    if props.is_empty() {
        return;
    }
    out.push_str("<a:rPr");
    for (name, value) in &props.extra_attrs {
        out.push_str(&format!(" {name}=\"{}\"", escape(value)));
    }
    if let Some(size) = props.size {
        out.push_str(&format!(" sz=\"{}\"", (size * 100.0).round() as i64));
    }
    if let Some(bold) = props.bold {
        out.push_str(&format!(" b=\"{}\"", u8::from(bold)));
    }
    if let Some(italic) = props.italic {
        out.push_str(&format!(" i=\"{}\"", u8::from(italic)));
    }

    let has_children = props.color.is_some() || props.font.is_some() || !props.extra.is_empty();
    if !has_children {
        out.push_str("/>");
        return;
    }
    out.push('>');
    let extras = |out: &mut String, rank: u8| {
        for (name, xml) in &props.extra {
            if run_child_rank(name) == rank {
                out.push_str(xml);
            }
        }
    };
    extras(out, 0);
    if let Some(color) = &props.color {
        out.push_str("<a:solidFill>");
        write_color(out, color);
        out.push_str("</a:solidFill>");
    }
    extras(out, 2);
    if let Some(font) = &props.font {
        out.push_str(&format!("<a:latin typeface=\"{}\"/>", escape(font)));
    }
    extras(out, 4);
    out.push_str("</a:rPr>");
}

fn write_picture(element: &Element, picture: &Picture) -> String {
    let mut out = String::from("<p:pic><p:nvPicPr>");
    write_c_nv_pr(&mut out, element);
    out.push_str("<p:cNvPicPr><a:picLocks noChangeAspect=\"1\"/></p:cNvPicPr>");
    write_nv_pr(&mut out, element.placeholder.as_ref());
    out.push_str(&format!(
        "</p:nvPicPr><p:blipFill><a:blip r:embed=\"{}\"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>",
        escape(&picture.embed)
    ));
    write_xfrm(&mut out, element, "a");
    out.push_str("<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></p:spPr></p:pic>");
    out
}

fn write_table(element: &Element, table: &Table) -> String {
    let mut out = String::from("<p:graphicFrame><p:nvGraphicFramePr>");
    write_c_nv_pr(&mut out, element);
    out.push_str("<p:cNvGraphicFramePr><a:graphicFrameLocks noGrp=\"1\"/></p:cNvGraphicFramePr>");
    write_nv_pr(&mut out, element.placeholder.as_ref());
    out.push_str("</p:nvGraphicFramePr>");
    write_xfrm(&mut out, element, "p");
    out.push_str(&format!(
        "<a:graphic><a:graphicData uri=\"{URI_TABLE}\"><a:tbl>"
    ));
    match &table.tbl_pr {
        Some(raw) => out.push_str(raw),
        None => {
            out.push_str(&format!(
                "<a:tblPr firstRow=\"1\" bandRow=\"1\"><a:tableStyleId>{DEFAULT_TABLE_STYLE}</a:tableStyleId></a:tblPr>"
            ));
        }
    }
    out.push_str("<a:tblGrid>");
    for width in &table.columns {
        out.push_str(&format!("<a:gridCol w=\"{width}\"/>"));
    }
    out.push_str("</a:tblGrid>");
    for row in &table.rows {
        out.push_str(&format!("<a:tr h=\"{}\">", row.height));
        for cell in &row.cells {
            out.push_str("<a:tc");
            if let Some(span) = cell.grid_span {
                out.push_str(&format!(" gridSpan=\"{span}\""));
            }
            if let Some(span) = cell.row_span {
                out.push_str(&format!(" rowSpan=\"{span}\""));
            }
            if cell.h_merge {
                out.push_str(" hMerge=\"1\"");
            }
            if cell.v_merge {
                out.push_str(" vMerge=\"1\"");
            }
            out.push('>');
            write_text_body(&mut out, &cell.text, "a", false);
            match &cell.tc_pr {
                Some(raw) => out.push_str(raw),
                None => out.push_str("<a:tcPr/>"),
            }
            out.push_str("</a:tc>");
        }
        out.push_str("</a:tr>");
    }
    out.push_str("</a:tbl></a:graphicData></a:graphic></p:graphicFrame>");
    out
}
