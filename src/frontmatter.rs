//! Front-matter splitting and serialization.
//!
//! A document may open with a metadata block delimited by `---` lines:
//!
//! ```text
//! ---
//! layout: post
//! title: Theming the navigation bar
//! ---
//! Body text, passed through byte-for-byte.
//! ```
//!
//! The block is YAML, read with `serde_yaml`, and must be a mapping.
//! Recognized keys are `layout` and `title`; any other key is kept as-is so
//! later stages can look at it (the scan stage honours `date` and
//! `published`).
//!
//! ## Degradation
//!
//! [`split`] never fails. If the opening delimiter is missing, the closing
//! delimiter never arrives, the block is not valid YAML, or it is YAML but
//! not a mapping, the whole input is returned as the body with an empty
//! mapping. The page is still published, with the default title and layout.
//!
//! ## Values
//!
//! Every value is kept as text:
//!
//! | YAML | Stored as |
//! |------|-----------|
//! | `title: Nav Bars # draft` | `Nav Bars` |
//! | `published: false` | `false` |
//! | `title:` | empty string |
//! | `tags: [swift, uikit]` or a block list | `swift, uikit` |
//! | `author: {name: ...}` | dropped |
//!
//! A repeated key is a YAML error, so the block is malformed.
//!
//! [`FrontMatter::to_block`] writes the mapping back out with `serde_yaml`,
//! so `split(compose(fm, body))` returns the same mapping and body.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Line that opens and closes a front-matter block.
pub const DELIMITER: &str = "---";

const BOM: char = '\u{feff}';

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("Invalid front matter key {0:?}: keys must be non-empty and on one line")]
    InvalidKey(String),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Parsed front-matter mapping.
///
/// Backed by a `BTreeMap`, so iteration and serialization are in key order.
/// Source key order is not preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrontMatter {
    entries: BTreeMap<String, String>,
}

impl FrontMatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// The `layout` key, naming the template to render with.
    pub fn layout(&self) -> Option<&str> {
        self.get("layout")
    }

    /// The `title` key.
    pub fn title(&self) -> Option<&str> {
        self.get("title")
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<String>, FrontMatterError> {
        let key = key.into();
        if !is_valid_key(&key) {
            return Err(FrontMatterError::InvalidKey(key));
        }
        Ok(self.entries.insert(key, value.into()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize as a delimited block, including the trailing newline.
    ///
    /// An empty mapping still produces `---\n---\n`, so composing it with a
    /// body that itself starts with `---` cannot be misread as a header.
    pub fn to_block(&self) -> Result<String, FrontMatterError> {
        let mut out = format!("{DELIMITER}\n");
        if !self.entries.is_empty() {
            out.push_str(&serde_yaml::to_string(&self.entries)?);
        }
        out.push_str(DELIMITER);
        out.push('\n');
        Ok(out)
    }
}

/// What [`split_with_state`] found at the top of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockState {
    /// A well-formed block (possibly empty) was split off.
    Present,
    /// The document does not open with a delimiter.
    Missing,
    /// The document opens with a delimiter but the block is unusable.
    Malformed,
}

/// Split raw document text into its front matter and body.
///
/// The body borrows from `raw`. When no well-formed block is found the body
/// is all of `raw` and the mapping is empty.
pub fn split(raw: &str) -> (FrontMatter, &str) {
    let (front_matter, body, _) = split_with_state(raw);
    (front_matter, body)
}

/// Like [`split`], also reporting whether a block was present, missing, or
/// malformed. The split itself is identical.
pub fn split_with_state(raw: &str) -> (FrontMatter, &str, BlockState) {
    let text = raw.strip_prefix(BOM).unwrap_or(raw);
    let opens_with_delimiter = lines_with_offsets(text)
        .next()
        .is_some_and(|line| is_delimiter(line.content));
    if !opens_with_delimiter {
        return (FrontMatter::default(), raw, BlockState::Missing);
    }

    match locate_block(text).and_then(|(block, body)| Some((parse_block(block)?, body))) {
        Some((front_matter, body)) => (front_matter, body, BlockState::Present),
        None => (FrontMatter::default(), raw, BlockState::Malformed),
    }
}

/// Rebuild document text from a mapping and a body.
pub fn compose(front_matter: &FrontMatter, body: &str) -> Result<String, FrontMatterError> {
    let mut out = front_matter.to_block()?;
    out.push_str(body);
    Ok(out)
}

/// A line of input with its trailing `\n` / `\r\n` stripped, plus the byte
/// offsets of its start and of the point just past its terminator.
struct Line<'a> {
    content: &'a str,
    start: usize,
    end: usize,
}

fn lines_with_offsets(text: &str) -> impl Iterator<Item = Line<'_>> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |raw_line| {
        let start = offset;
        offset += raw_line.len();
        let content = raw_line.strip_suffix('\n').unwrap_or(raw_line);
        let content = content.strip_suffix('\r').unwrap_or(content);
        Line {
            content,
            start,
            end: offset,
        }
    })
}

/// Find the block text between the delimiters and the body after them.
fn locate_block(text: &str) -> Option<(&str, &str)> {
    let mut lines = lines_with_offsets(text);
    let opening = lines.next()?;
    lines
        .find(|line| is_delimiter(line.content))
        .map(|closing| (&text[opening.end..closing.start], &text[closing.end..]))
}

fn parse_block(block: &str) -> Option<FrontMatter> {
    let only_comments = block.lines().all(|line| {
        let trimmed = line.trim();
        trimmed.is_empty() || trimmed.starts_with('#')
    });
    if only_comments {
        return Some(FrontMatter::default());
    }

    let mapping = match serde_yaml::from_str::<Value>(block).ok()? {
        Value::Mapping(mapping) => mapping,
        Value::Null => return Some(FrontMatter::default()),
        _ => return None,
    };

    let mut entries = BTreeMap::new();
    for (key, value) in &mapping {
        let key = scalar_text(key).filter(|k| is_valid_key(k))?;
        if let Some(text) = value_text(value) {
            entries.insert(key, text);
        }
    }
    Some(FrontMatter { entries })
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty() && !key.chars().any(char::is_control)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Text for a top-level value. Lists of scalars are joined with `, `; nested
/// mappings have no flat form and yield `None`.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Sequence(items) => items
            .iter()
            .map(scalar_text)
            .collect::<Option<Vec<_>>>()
            .map(|items| items.join(", ")),
        Value::Tagged(tagged) => value_text(&tagged.value),
        other => scalar_text(other),
    }
}
