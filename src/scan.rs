//! Content discovery and manifest generation.
//!
//! Stage 1 of the build pipeline. Walks the content directory, splits each
//! document's front matter from its body, resolves titles/layouts/dates, and
//! produces a [`Manifest`] the generate stage consumes.
//!
//! ## Directory Structure
//!
//! ```text
//! content/                               # Content root
//! ├── config.toml                        # Site configuration (optional)
//! ├── assets/                            # Copied verbatim to the output root
//! ├── _posts/                            # `_` dirs group files, not in URLs
//! │   ├── 2016-05-12-nav-bar-theming.md  # Dated post → 2016/05/12/nav-bar-theming.html
//! │   └── 2017-02-01-generic-cells.md
//! ├── 010-about.md                       # Numbered page → about.html
//! └── notes/
//!     └── localization.txt               # Plain document → notes/localization.html
//! ```
//!
//! ## Degradation
//!
//! A document whose front matter is missing or malformed is still published
//! with the default title and layout. The only hard errors are I/O failures,
//! an invalid `config.toml`, and two documents that would write the same
//! output file.
//!
//! ## Parallelism
//!
//! Documents are independent, so reading and parsing runs on the rayon pool.
//! The resulting page list is sorted afterwards, so output is deterministic.

use crate::config::{self, CONFIG_FILENAME, SiteConfig};
use crate::frontmatter::{self, BlockState};
use crate::metadata::{self, sanitize_slug};
use crate::naming::parse_entry_name;
use crate::types::{Page, SkippedDocument};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Content root not found: {0}")]
    MissingRoot(PathBuf),
    #[error("{first} and {second} both map to {url}")]
    DuplicateUrl {
        url: String,
        first: String,
        second: String,
    },
    #[error("{path} maps to {url}, which is reserved for the generated index")]
    ReservedUrl { url: String, path: String },
}

/// URL of the generated listing page.
pub const INDEX_URL: &str = "index.html";

/// Manifest output from the scan stage.
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub pages: Vec<Page>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedDocument>,
    pub config: SiteConfig,
}

impl Manifest {
    /// Pages shown in the index listing, in display order.
    pub fn indexed_pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter().filter(|p| p.in_index())
    }
}

/// A document read from disk, before it is accepted or skipped.
enum Scanned {
    Page(Box<Page>),
    Skipped(SkippedDocument),
}

/// Scan a content root, loading `config.toml` from it.
pub fn scan(root: &Path) -> Result<Manifest, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }
    let config = config::load_config(root)?;
    scan_with_config(root, config)
}

/// Scan a content root with an already-loaded config.
pub fn scan_with_config(root: &Path, config: SiteConfig) -> Result<Manifest, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }

    let sources = discover_documents(root, &config)?;
    debug!(count = sources.len(), root = %root.display(), "discovered documents");

    let scanned: Vec<Scanned> = sources
        .par_iter()
        .map(|path| load_document(root, path, &config))
        .collect::<Result<_, _>>()?;

    let mut pages = Vec::new();
    let mut skipped = Vec::new();
    for item in scanned {
        match item {
            Scanned::Page(page) => pages.push(*page),
            Scanned::Skipped(doc) => skipped.push(doc),
        }
    }

    check_urls(&pages)?;
    warn_duplicate_titles(&pages);

    pages.sort_by(Page::display_order);
    skipped.sort_by(|a, b| a.source_path.cmp(&b.source_path));

    Ok(Manifest {
        pages,
        skipped,
        config,
    })
}

/// Find every document under `root`, sorted by path.
fn discover_documents(root: &Path, config: &SiteConfig) -> Result<Vec<PathBuf>, ScanError> {
    let mut documents = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_ignored(entry, config));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_document = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| config.is_document_extension(e));
        if is_document {
            documents.push(entry.into_path());
        }
    }
    Ok(documents)
}

fn is_ignored(entry: &DirEntry, config: &SiteConfig) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') || config.content.exclude.iter().any(|e| *e == name) {
        return true;
    }
    if entry.depth() == 1 {
        if entry.file_type().is_file() && name == CONFIG_FILENAME {
            return true;
        }
        if entry.file_type().is_dir() && name == config.content.assets_dir.as_str() {
            return true;
        }
    }
    false
}

/// Read one document and resolve it into a page (or a skip record).
fn load_document(root: &Path, path: &Path, config: &SiteConfig) -> Result<Scanned, ScanError> {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let source_path = to_url_path(rel);

    let bytes = fs::read(path)?;
    let raw = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            warn!(path = %source_path, "document is not valid UTF-8; invalid bytes replaced");
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    };

    let (front_matter, body, block) = frontmatter::split_with_state(&raw);
    if block == BlockState::Malformed {
        warn!(path = %source_path, "malformed front matter; using default title and layout");
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = parse_entry_name(&stem);
    let meta = metadata::resolve_document(&name, &front_matter, body, &config.defaults);

    if let Some(raw_date) = &meta.invalid_date {
        warn!(path = %source_path, date = %raw_date, "unparseable front-matter date ignored");
    }
    if !meta.published {
        debug!(path = %source_path, "skipping unpublished document");
        return Ok(Scanned::Skipped(SkippedDocument {
            source_path,
            reason: "published: false".to_string(),
        }));
    }

    let slug = document_slug(&name.name, &stem, &source_path);
    let url = match meta.date {
        Some(date) => format!("{}/{}.html", date.url_dir(), slug),
        None => match url_dir(rel) {
            dir if dir.is_empty() => format!("{slug}.html"),
            dir => format!("{dir}/{slug}.html"),
        },
    };

    debug!(path = %source_path, %url, layout = %meta.layout, "scanned document");

    Ok(Scanned::Page(Box::new(Page {
        title: meta.title,
        title_source: meta.title_source,
        layout: meta.layout,
        slug,
        url,
        source_path,
        date: meta.date,
        number: name.number,
        front_matter,
        block,
        body: body.to_string(),
    })))
}

/// Slug from the prefix-stripped name, then the raw stem. Names with no
/// ASCII alphanumerics get a stable hash of their source path instead.
fn document_slug(name: &str, stem: &str, source_path: &str) -> String {
    let slug = sanitize_slug(name);
    if !slug.is_empty() {
        return slug;
    }
    let slug = sanitize_slug(stem);
    if !slug.is_empty() {
        return slug;
    }
    let digest = Sha256::digest(source_path.as_bytes());
    let hex: String = digest.iter().take(4).map(|b| format!("{b:02x}")).collect();
    format!("page-{hex}")
}

/// URL directory for an undated document: parent directories, sanitized,
/// with `_`-prefixed grouping directories dropped.
fn url_dir(rel: &Path) -> String {
    rel.parent()
        .into_iter()
        .flat_map(|p| p.components())
        .map(|c| c.as_os_str().to_string_lossy())
        .filter(|c| !c.starts_with('_'))
        .map(|c| sanitize_slug(&c))
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Relative path with `/` separators on every platform.
fn to_url_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn check_urls(pages: &[Page]) -> Result<(), ScanError> {
    let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
    for page in pages {
        if page.url == INDEX_URL {
            return Err(ScanError::ReservedUrl {
                url: page.url.clone(),
                path: page.source_path.clone(),
            });
        }
        if let Some(first) = seen.insert(&page.url, &page.source_path) {
            let (first, second) = if first <= page.source_path.as_str() {
                (first, page.source_path.as_str())
            } else {
                (page.source_path.as_str(), first)
            };
            return Err(ScanError::DuplicateUrl {
                url: page.url.clone(),
                first: first.to_string(),
                second: second.to_string(),
            });
        }
    }
    Ok(())
}

/// Near-duplicate posts are published as-is; shared titles are only reported.
fn warn_duplicate_titles(pages: &[Page]) {
    let mut by_title: HashMap<&str, Vec<&str>> = HashMap::new();
    for page in pages {
        by_title
            .entry(page.title.as_str())
            .or_default()
            .push(page.source_path.as_str());
    }
    let mut shared: Vec<_> = by_title.into_iter().filter(|(_, v)| v.len() > 1).collect();
    shared.sort();
    for (title, mut sources) in shared {
        sources.sort();
        warn!(title, sources = ?sources, "several documents share a title");
    }
}
