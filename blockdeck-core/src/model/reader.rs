//! Shape tree reader
//!
//! Turns the `p:spTree` of a slide, layout or master into [`Element`]s. Every
//! element keeps a copy of its original markup.

use roxmltree::{Document, Node};

use super::element::{
    ChartFrame, Element, ElementBody, Fill, Geometry, OpaqueElement, Picture, PlaceholderInfo,
    PlaceholderType, Shape, Table, TableCell, TableRow,
};
use super::text::{Alignment, ColorValue, Paragraph, Rgb, Run, RunProps, TextBody, TextField};
use crate::error::{DeckError, Result};
use crate::geometry::Bounds;
use crate::package::xml::{
    attr_bool, attr_i64, attr_u32, child, children, is, raw, NS_A, NS_P, NS_R, URI_CHART,
    URI_TABLE,
};

/// Locate `p:cSld/p:spTree` of a slide-like part
pub(crate) fn shape_tree<'a, 'input>(doc: &'a Document<'input>) -> Result<Node<'a, 'input>> {
    child(doc.root_element(), NS_P, "cSld")
        .and_then(|c_sld| child(c_sld, NS_P, "spTree"))
        .ok_or_else(|| DeckError::InvalidStructure("part has no shape tree".to_string()))
}

/// Read every element of the shape tree in `xml`, in document order
pub(crate) fn read_elements(xml: &str) -> Result<Vec<Element>> {
    let doc = Document::parse(xml)?;
    let tree = shape_tree(&doc)?;
    Ok(tree
        .children()
        .filter(|n| n.is_element())
        .filter(|n| !matches!(n.tag_name().name(), "nvGrpSpPr" | "grpSpPr" | "extLst"))
        .map(|n| read_element(xml, n))
        .collect())
}

fn read_element(source: &str, node: Node) -> Element {
    let body = match node.tag_name().name() {
        "sp" if node.tag_name().namespace() == Some(NS_P) => {
            ElementBody::Shape(read_shape(source, node))
        }
        "pic" if node.tag_name().namespace() == Some(NS_P) => read_picture(source, node),
        "graphicFrame" if node.tag_name().namespace() == Some(NS_P) => {
            read_graphic_frame(source, node)
        }
        tag => ElementBody::Opaque(OpaqueElement {
            tag: tag.to_string(),
            xml: raw(source, node).to_string(),
        }),
    };

    let non_visual = node
        .children()
        .find(|n| n.is_element() && n.tag_name().name().starts_with("nv"));
    let c_nv_pr = non_visual.and_then(|nv| child(nv, NS_P, "cNvPr"));
    let placeholder = non_visual
        .and_then(|nv| child(nv, NS_P, "nvPr"))
        .and_then(|nv_pr| child(nv_pr, NS_P, "ph"))
        .map(|ph| PlaceholderInfo {
            kind: ph
                .attribute("type")
                .and_then(PlaceholderType::from_ooxml)
                .unwrap_or(PlaceholderType::Object),
            idx: attr_u32(ph, "idx"),
        });

    let transform = find_transform(node);
    let bounds = transform.map(read_bounds).unwrap_or_default();

    Element {
        id: c_nv_pr.and_then(|n| attr_u32(n, "id")).unwrap_or(0),
        name: c_nv_pr
            .and_then(|n| n.attribute("name"))
            .unwrap_or_default()
            .to_string(),
        description: c_nv_pr
            .and_then(|n| n.attribute("descr"))
            .map(str::to_string),
        bounds,
        placeholder,
        body,
        inherited_bounds: if transform.is_none() {
            Some(bounds)
        } else {
            None
        },
        raw: Some(raw(source, node).to_string()),
    }
}

/// `a:xfrm` of a shape or picture, `p:xfrm` of a graphic frame
fn find_transform<'a, 'input>(node: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    if let Some(xfrm) = child(node, NS_P, "xfrm") {
        return Some(xfrm);
    }
    let sp_pr = node
        .children()
        .find(|n| is(*n, NS_P, "spPr") || is(*n, NS_P, "grpSpPr"));
    match sp_pr {
        Some(sp_pr) => child(sp_pr, NS_A, "xfrm"),
        // mc:AlternateContent and friends
        None if node.tag_name().namespace() != Some(NS_P) => node
            .descendants()
            .find(|n| is(*n, NS_A, "xfrm") || is(*n, NS_P, "xfrm")),
        None => None,
    }
}

fn read_bounds(xfrm: Node) -> Bounds {
    let off = child(xfrm, NS_A, "off");
    let ext = child(xfrm, NS_A, "ext");
    Bounds::new(
        off.and_then(|n| attr_i64(n, "x")).unwrap_or(0),
        off.and_then(|n| attr_i64(n, "y")).unwrap_or(0),
        ext.and_then(|n| attr_i64(n, "cx")).unwrap_or(0),
        ext.and_then(|n| attr_i64(n, "cy")).unwrap_or(0),
    )
}

fn read_shape(source: &str, node: Node) -> Shape {
    let mut shape = Shape {
        text_box: child(node, NS_P, "nvSpPr")
            .and_then(|nv| child(nv, NS_P, "cNvSpPr"))
            .and_then(|c| attr_bool(c, "txBox"))
            .unwrap_or(false),
        ..Shape::default()
    };

    if let Some(sp_pr) = child(node, NS_P, "spPr") {
        for item in sp_pr.children().filter(Node::is_element) {
            match item.tag_name().name() {
                "xfrm" => {}
                "prstGeom" => shape.geometry = Some(read_preset_geometry(source, item)),
                "custGeom" => {
                    shape.geometry = Some(Geometry::Custom(raw(source, item).to_string()))
                }
                "noFill" | "solidFill" | "gradFill" | "blipFill" | "pattFill" | "grpFill" => {
                    shape.fill = Some(read_fill(source, item))
                }
                _ => shape.sp_pr_extra.push(raw(source, item).to_string()),
            }
        }
    }
    shape.style = child(node, NS_P, "style").map(|n| raw(source, n).to_string());
    shape.text = child(node, NS_P, "txBody").map(|n| read_text_body(source, n));
    shape
}

fn read_preset_geometry(source: &str, node: Node) -> Geometry {
    let adjusted = child(node, NS_A, "avLst")
        .map(|av| av.children().any(|n| n.is_element()))
        .unwrap_or(false);
    match node.attribute("prst") {
        Some(prst) if !adjusted => Geometry::Preset(prst.to_string()),
        _ => Geometry::Custom(raw(source, node).to_string()),
    }
}

fn read_fill(source: &str, node: Node) -> Fill {
    match node.tag_name().name() {
        "noFill" => Fill::NoFill,
        "solidFill" => match read_color(source, node) {
            Some(color) => Fill::Solid(color),
            None => Fill::Other(raw(source, node).to_string()),
        },
        _ => Fill::Other(raw(source, node).to_string()),
    }
}

/// Colour held by a fill element such as `a:solidFill`
fn read_color(source: &str, fill: Node) -> Option<ColorValue> {
    let color = fill.children().find(Node::is_element)?;
    let modified = color.children().any(|n| n.is_element());
    let value = match color.tag_name().name() {
        "srgbClr" if !modified => color
            .attribute("val")
            .and_then(Rgb::from_hex)
            .map(ColorValue::Rgb),
        "schemeClr" if !modified => color
            .attribute("val")
            .map(|val| ColorValue::Scheme(val.to_string())),
        _ => None,
    };
    Some(value.unwrap_or_else(|| ColorValue::Other(raw(source, color).to_string())))
}

pub(crate) fn read_text_body(source: &str, node: Node) -> TextBody {
    let body_pr = child(node, NS_A, "bodyPr");
    TextBody {
        word_wrap: body_pr.and_then(|n| match n.attribute("wrap") {
            Some("square") => Some(true),
            Some("none") => Some(false),
            _ => None,
        }),
        body_pr: body_pr.map(|n| raw(source, n).to_string()),
        list_style: child(node, NS_A, "lstStyle").map(|n| raw(source, n).to_string()),
        paragraphs: children(node, NS_A, "p")
            .map(|p| read_paragraph(source, p))
            .collect(),
    }
}

fn read_paragraph(source: &str, node: Node) -> Paragraph {
    let mut paragraph = Paragraph::default();

    if let Some(p_pr) = child(node, NS_A, "pPr") {
        for attr in p_pr.attributes().filter(|a| a.namespace().is_none()) {
            match attr.name() {
                "algn" => paragraph.alignment = Alignment::from_ooxml(attr.value()),
                "lvl" => paragraph.level = attr.value().parse().ok(),
                name => paragraph
                    .p_pr_attrs
                    .push((name.to_string(), attr.value().to_string())),
            }
        }
        paragraph.p_pr_children = p_pr
            .children()
            .filter(Node::is_element)
            .map(|n| raw(source, n).to_string())
            .collect();
    }

    for item in node.children().filter(Node::is_element) {
        match item.tag_name().name() {
            "r" | "fld" => paragraph.runs.push(Run {
                text: child(item, NS_A, "t").map(text_of).unwrap_or_default(),
                props: child(item, NS_A, "rPr")
                    .map(|r_pr| read_run_props(source, r_pr))
                    .unwrap_or_default(),
                line_break: false,
                field: (item.tag_name().name() == "fld").then(|| TextField {
                    id: item.attribute("id").unwrap_or_default().to_string(),
                    kind: item.attribute("type").map(str::to_string),
                }),
            }),
            "br" => paragraph.runs.push(Run {
                props: child(item, NS_A, "rPr")
                    .map(|r_pr| read_run_props(source, r_pr))
                    .unwrap_or_default(),
                ..Run::line_break()
            }),
            "endParaRPr" => paragraph.end_props = Some(raw(source, item).to_string()),
            _ => {}
        }
    }
    paragraph
}

fn read_run_props(source: &str, node: Node) -> RunProps {
    let mut props = RunProps::default();
    for attr in node.attributes().filter(|a| a.namespace().is_none()) {
        match attr.name() {
            "sz" => {
                props.size = attr
                    .value()
                    .parse::<f64>()
                    .ok()
                    .map(|hundredths| hundredths / 100.0)
            }
            "b" => props.bold = Some(matches!(attr.value(), "1" | "true")),
            "i" => props.italic = Some(matches!(attr.value(), "1" | "true")),
            name => props
                .extra_attrs
                .push((name.to_string(), attr.value().to_string())),
        }
    }
    for item in node.children().filter(Node::is_element) {
        match item.tag_name().name() {
            "solidFill" if props.color.is_none() => props.color = read_color(source, item),
            "latin" if props.font.is_none() => {
                props.font = item.attribute("typeface").map(str::to_string)
            }
            name => props
                .extra
                .push((name.to_string(), raw(source, item).to_string())),
        }
    }
    props
}

fn text_of(node: Node) -> String {
    node.children()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}

fn read_picture(_source: &str, node: Node) -> ElementBody {
    let embed = child(node, NS_P, "blipFill")
        .and_then(|fill| child(fill, NS_A, "blip"))
        .and_then(|blip| blip.attribute((NS_R, "embed")))
        .unwrap_or_default();
    ElementBody::Picture(Picture {
        embed: embed.to_string(),
    })
}

fn read_graphic_frame(source: &str, node: Node) -> ElementBody {
    let data = child(node, NS_A, "graphic").and_then(|g| child(g, NS_A, "graphicData"));
    match data.and_then(|d| d.attribute("uri").map(|uri| (d, uri))) {
        Some((data, URI_TABLE)) => match child(data, NS_A, "tbl") {
            Some(tbl) => ElementBody::Table(read_table(source, tbl)),
            None => opaque(source, node),
        },
        Some((data, URI_CHART)) => ElementBody::Chart(ChartFrame {
            chart_rel: data
                .children()
                .find(|n| n.is_element() && n.tag_name().name() == "chart")
                .and_then(|chart| chart.attribute((NS_R, "id")))
                .map(str::to_string),
            xml: raw(source, node).to_string(),
        }),
        _ => opaque(source, node),
    }
}

fn opaque(source: &str, node: Node) -> ElementBody {
    ElementBody::Opaque(OpaqueElement {
        tag: node.tag_name().name().to_string(),
        xml: raw(source, node).to_string(),
    })
}

fn read_table(source: &str, tbl: Node) -> Table {
    Table {
        tbl_pr: child(tbl, NS_A, "tblPr").map(|n| raw(source, n).to_string()),
        columns: child(tbl, NS_A, "tblGrid")
            .map(|grid| {
                children(grid, NS_A, "gridCol")
                    .map(|col| attr_i64(col, "w").unwrap_or(0).max(0))
                    .collect()
            })
            .unwrap_or_default(),
        rows: children(tbl, NS_A, "tr")
            .map(|tr| TableRow {
                height: attr_i64(tr, "h").unwrap_or(0).max(0),
                cells: children(tr, NS_A, "tc")
                    .map(|tc| TableCell {
                        text: child(tc, NS_A, "txBody")
                            .map(|n| read_text_body(source, n))
                            .unwrap_or_default(),
                        grid_span: attr_u32(tc, "gridSpan"),
                        row_span: attr_u32(tc, "rowSpan"),
                        h_merge: attr_bool(tc, "hMerge").unwrap_or(false),
                        v_merge: attr_bool(tc, "vMerge").unwrap_or(false),
                        tc_pr: child(tc, NS_A, "tcPr").map(|n| raw(source, n).to_string()),
                    })
                    .collect(),
            })
            .collect(),
    }
}
