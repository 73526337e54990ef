//! `[Content_Types].xml`

use std::collections::BTreeMap;

use super::xml::{escape, is, NS_CONTENT_TYPES};
use crate::error::Result;

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Content type table of a package.
///
/// Part names are stored without their leading slash; extensions lower-case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentTypes {
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl ContentTypes {
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(xml)?;
        let mut types = Self::default();
        for node in doc.root_element().children() {
            if is(node, NS_CONTENT_TYPES, "Default") {
                if let (Some(ext), Some(ct)) =
                    (node.attribute("Extension"), node.attribute("ContentType"))
                {
                    types.add_default(ext, ct);
                }
            } else if is(node, NS_CONTENT_TYPES, "Override") {
                if let (Some(part), Some(ct)) =
                    (node.attribute("PartName"), node.attribute("ContentType"))
                {
                    types.set_override(part, ct);
                }
            }
        }
        Ok(types)
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n",
        );
        xml.push_str(&format!("<Types xmlns=\"{NS_CONTENT_TYPES}\">"));
        for (ext, ct) in &self.defaults {
            xml.push_str(&format!(
                "<Default Extension=\"{}\" ContentType=\"{}\"/>",
                escape(ext),
                escape(ct)
            ));
        }
        for (part, ct) in &self.overrides {
            xml.push_str(&format!(
                "<Override PartName=\"/{}\" ContentType=\"{}\"/>",
                escape(part),
                escape(ct)
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        self.defaults
            .insert(extension.to_ascii_lowercase(), content_type.to_string());
    }

    pub fn has_default(&self, extension: &str) -> bool {
        self.defaults.contains_key(&extension.to_ascii_lowercase())
    }

    pub fn set_override(&mut self, part: &str, content_type: &str) {
        self.overrides.insert(
            part.trim_start_matches('/').to_string(),
            content_type.to_string(),
        );
    }

    pub fn remove_override(&mut self, part: &str) -> Option<String> {
        self.overrides.remove(part.trim_start_matches('/'))
    }

    /// Content type of a part: its override, else the default for its extension
    pub fn content_type(&self, part: &str) -> Option<&str> {
        let part = part.trim_start_matches('/');
        if let Some(ct) = self.overrides.get(part) {
            return Some(ct);
        }
        let ext = part.rsplit_once('.')?.1.to_ascii_lowercase();
        self.defaults.get(&ext).map(String::as_str)
    }

    /// Parts with an override of the given content type
    pub fn parts_of_type<'a>(&'a self, content_type: &'a str) -> impl Iterator<Item = &'a str> {
        self.overrides
            .iter()
            .filter(move |(_, ct)| ct.as_str() == content_type)
            .map(|(part, _)| part.as_str())
    }
}
