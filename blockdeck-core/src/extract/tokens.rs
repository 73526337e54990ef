//! Field tokens: `{{label.name}}` markers embedded in element text

use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static::lazy_static! {
    /// Label excludes `.` and `}`; name excludes `}`
    static ref TOKEN_PATTERN: Regex =
        Regex::new(r"\{\{([^.}]+)\.([^}]+)\}\}").expect("token pattern is valid");
}

/// One parsed field token.
///
/// The label is the field type (`title`, `text`, ...) and the name is the
/// field key. `raw_text` is the token exactly as written, braces included.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldToken {
    pub label: String,
    pub name: String,
    pub raw_text: String,
}

impl FieldToken {
    /// `label.name`, the key the substitution fallback looks up
    pub fn key(&self) -> String {
        format!("{}.{}", self.label, self.name)
    }
}

/// All well-formed tokens in `text`, left to right
pub fn extract(text: &str) -> Vec<FieldToken> {
    TOKEN_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let label = caps.get(1)?.as_str().trim();
            let name = caps.get(2)?.as_str().trim();
            if label.is_empty() || name.is_empty() {
                return None;
            }
            Some(FieldToken {
                label: label.to_string(),
                name: name.to_string(),
                raw_text: caps.get(0)?.as_str().to_string(),
            })
        })
        .collect()
}

/// Whether `text` still holds an opening and a closing token brace
pub fn contains_token_markers(text: &str) -> bool {
    text.contains("{{") && text.contains("}}")
}
