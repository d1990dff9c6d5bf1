//! Shared types used across pipeline stages.
//!
//! These types are serialized to JSON between stages (scan → generate)
//! and must be identical on both sides.

use crate::frontmatter::{BlockState, FrontMatter};
use crate::metadata::TitleSource;
use crate::naming::PostDate;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};

/// Layout that keeps a page out of the index listing.
pub const STANDALONE_LAYOUT: &str = "page";

/// A content document with its metadata resolved.
///
/// Pages are immutable once scanned. A revised post is a new document with
/// its own file; the scan stage does not try to relate the two.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Resolved title (see [`crate::metadata`] for the priority order).
    pub title: String,
    pub title_source: TitleSource,
    /// Layout name. Resolved to a template at render time.
    pub layout: String,
    /// URL slug (filename with date/number prefix stripped, sanitized).
    pub slug: String,
    /// Output path relative to the site root, e.g. `2016/05/12/nav-bars.html`.
    pub url: String,
    /// Source path relative to the content root.
    pub source_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<PostDate>,
    /// Number prefix from the filename (`NNN-name`), used for ordering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    /// Every key from the front-matter block, recognized or not.
    #[serde(default, skip_serializing_if = "FrontMatter::is_empty")]
    pub front_matter: FrontMatter,
    pub block: BlockState,
    /// Body text exactly as it followed the front-matter block.
    pub body: String,
}

impl Page {
    /// Whether the page is listed on the index page.
    pub fn in_index(&self) -> bool {
        self.layout != STANDALONE_LAYOUT
    }

    /// Sort key: dated posts newest first, then numbered pages by number,
    /// then everything else. Ties break on URL, which is unique.
    fn sort_key(&self) -> (u8, Reverse<Option<PostDate>>, Option<u32>, &str) {
        let group = match (self.date, self.number) {
            (Some(_), _) => 0,
            (None, Some(_)) => 1,
            (None, None) => 2,
        };
        (group, Reverse(self.date), self.number, self.url.as_str())
    }

    pub fn display_order(a: &Page, b: &Page) -> Ordering {
        a.sort_key().cmp(&b.sort_key())
    }
}

/// A document that was found but deliberately not published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub source_path: String,
    pub reason: String,
}
