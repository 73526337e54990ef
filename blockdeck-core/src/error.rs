use thiserror::Error;

use crate::model::ElementKind;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid package: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Missing package part: {0}")]
    MissingPart(String),

    #[error("Invalid presentation structure: {0}")]
    InvalidStructure(String),

    #[error("Slide index {0} out of bounds (presentation has {1} slides)")]
    InvalidSlideIndex(usize, usize),

    #[error("Block document has no slides")]
    EmptyBlock,

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeckError>;

/// Why a single element was left out of an extraction or copy pass.
///
/// These never abort the pass; they are collected into reports.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    #[error("unsupported element kind: {0}")]
    Unsupported(ElementKind),

    #[error("image relationship {0} cannot be resolved")]
    MissingImage(String),

    #[error("image cannot be decoded: {0}")]
    InvalidImage(String),

    #[error("element has no text body")]
    MissingTextBody,

    #[error("table has no rows or columns")]
    EmptyTable,
}
