//! OOXML package container
//!
//! A presentation is a zip archive of XML parts and media. [`Package`] holds
//! every part as raw bytes keyed by its name (without the leading slash) so
//! that parts the library never interprets survive a round trip unchanged.

mod content_types;
mod relationships;
pub(crate) mod template;
pub(crate) mod xml;

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{DeckError, Result};

pub use content_types::{ContentTypes, CONTENT_TYPES_PART};
pub use relationships::{
    rels_part_for, relative_target, resolve_target, Relationship, Relationships,
};

#[derive(Debug, Clone)]
pub struct Package {
    parts: BTreeMap<String, Vec<u8>>,
    content_types: ContentTypes,
}

impl Package {
    /// Read every entry of a zip container
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = BTreeMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.insert(name, data);
        }

        let content_types = match parts.remove(CONTENT_TYPES_PART) {
            Some(data) => ContentTypes::parse(utf8(CONTENT_TYPES_PART, &data)?)?,
            None => return Err(DeckError::MissingPart(CONTENT_TYPES_PART.to_string())),
        };
        tracing::debug!("Read package with {} parts", parts.len());
        Ok(Self {
            parts,
            content_types,
        })
    }

    /// Empty presentation package
    pub fn template() -> Result<Self> {
        let mut parts: BTreeMap<String, Vec<u8>> = template::parts()
            .into_iter()
            .map(|(name, data)| (name.to_string(), data))
            .collect();
        let content_types = match parts.remove(CONTENT_TYPES_PART) {
            Some(data) => ContentTypes::parse(utf8(CONTENT_TYPES_PART, &data)?)?,
            None => return Err(DeckError::MissingPart(CONTENT_TYPES_PART.to_string())),
        };
        Ok(Self {
            parts,
            content_types,
        })
    }

    /// Write the package as a zip container; `[Content_Types].xml` first
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let options = SimpleFileOptions::default().compression_method(compression_method());
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        writer.start_file(CONTENT_TYPES_PART, options)?;
        writer.write_all(self.content_types.to_xml().as_bytes())?;

        for (name, data) in &self.parts {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
        }
        Ok(writer.finish()?.into_inner())
    }

    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    pub fn content_types_mut(&mut self) -> &mut ContentTypes {
        &mut self.content_types
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    /// Part decoded as UTF-8 text
    pub fn part_str(&self, name: &str) -> Result<&str> {
        let data = self
            .parts
            .get(name)
            .ok_or_else(|| DeckError::MissingPart(name.to_string()))?;
        utf8(name, data)
    }

    pub fn set_part(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.parts.insert(name.into(), data);
    }

    pub fn remove_part(&mut self, name: &str) -> Option<Vec<u8>> {
        self.content_types.remove_override(name);
        self.parts.remove(name)
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    /// Relationships of `part`; a part without a rels part has none
    pub fn relationships(&self, part: &str) -> Result<Relationships> {
        let rels_part = rels_part_for(part);
        if !self.parts.contains_key(&rels_part) {
            return Ok(Relationships::new());
        }
        Relationships::parse(self.part_str(&rels_part)?)
    }

    pub fn set_relationships(&mut self, part: &str, rels: &Relationships) {
        self.parts
            .insert(rels_part_for(part), rels.to_xml().into_bytes());
    }

    /// First unused `<prefix><n>.<ext>`, counting from 1
    pub fn next_part_name(&self, prefix: &str, ext: &str) -> String {
        (1..)
            .map(|n| format!("{prefix}{n}.{ext}"))
            .find(|name| !self.parts.contains_key(name))
            .unwrap_or_else(|| format!("{prefix}.{ext}"))
    }
}

#[cfg(feature = "compression")]
fn compression_method() -> CompressionMethod {
    CompressionMethod::Deflated
}

#[cfg(not(feature = "compression"))]
fn compression_method() -> CompressionMethod {
    CompressionMethod::Stored
}

fn utf8<'a>(name: &str, data: &'a [u8]) -> Result<&'a str> {
    let text = std::str::from_utf8(data)
        .map_err(|e| DeckError::InvalidStructure(format!("{name} is not UTF-8: {e}")))?;
    Ok(text.trim_start_matches('\u{feff}'))
}
