//! Render cache for incremental builds.
//!
//! Rendering a single page is cheap, but a site with a few thousand posts
//! still spends most of a rebuild rewriting files that did not change. This
//! module lets the generate stage skip a page when neither its source text
//! nor anything that shapes its HTML has changed since the last build.
//!
//! ## Cache keys
//!
//! Entries are keyed by output path (`2016/05/12/nav-bars.html`), each
//! holding two hashes:
//!
//! - **`source_hash`**: SHA-256 of the document body and front matter as
//!   scanned. Content-based rather than mtime-based so it survives
//!   `git checkout`.
//!
//! - **`params_hash`**: SHA-256 of everything else the rendered page
//!   depends on: resolved title, layout, date, URL, the site metadata and
//!   the stylesheet. Changing a config color re-renders every page.
//!
//! A cache hit requires:
//! 1. An entry for the output path with matching `source_hash` and
//!    `params_hash`
//! 2. The previously-written output file still exists on disk
//!
//! The index page lists every page, so it is always rewritten.
//!
//! ## Storage
//!
//! The cache is a JSON file at `<output_dir>/.render-cache.json`, so it
//! travels with the output directory.
//!
//! ## Bypassing the cache
//!
//! Pass `--no-cache` to `build` or `generate` to re-render every page and
//! overwrite the old files. The previous cache is still read so outputs of
//! removed pages can be deleted.

use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the cache file within the output directory.
pub const CACHE_FILENAME: &str = ".render-cache.json";

/// Version of the cache format. Bump this to invalidate all existing caches
/// when the format or key computation changes.
const CACHE_VERSION: u32 = 2;

/// Hashes recorded for one rendered output file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
}

/// On-disk render cache mapping output paths to their cache entries.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RenderCache {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
}

impl RenderCache {
    /// Create an empty cache (first build, or an unreadable cache file).
    pub fn empty() -> Self {
        Self {
            version: CACHE_VERSION,
            entries: HashMap::new(),
        }
    }

    /// Load from the output directory. Returns an empty cache if the file
    /// doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(output_dir: &Path) -> Self {
        let path = cache_path(output_dir);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let cache: Self = match serde_json::from_str(&content) {
            Ok(c) => c,
            Err(err) => {
                tracing::debug!(path = %path.display(), %err, "discarding unreadable render cache");
                return Self::empty();
            }
        };
        if cache.version != CACHE_VERSION {
            tracing::debug!(found = cache.version, expected = CACHE_VERSION, "render cache version changed");
            return Self::empty();
        }
        cache
    }

    /// Save to the output directory.
    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(cache_path(output_dir), json)
    }

    /// Whether `output_path` can be left as it is on disk.
    pub fn is_fresh(
        &self,
        output_path: &str,
        source_hash: &str,
        params_hash: &str,
        output_dir: &Path,
    ) -> bool {
        self.entries.get(output_path).is_some_and(|entry| {
            entry.source_hash == source_hash && entry.params_hash == params_hash
        }) && output_dir.join(output_path).is_file()
    }

    /// Record the hashes an output file was rendered from.
    pub fn insert(&mut self, output_path: String, source_hash: String, params_hash: String) {
        self.entries.insert(
            output_path,
            CacheEntry {
                source_hash,
                params_hash,
            },
        );
    }

    /// Drop entries for outputs that are no longer produced, returning the
    /// dropped output paths in sorted order.
    pub fn retain_outputs<'a>(&mut self, outputs: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let keep: HashSet<&str> = outputs.into_iter().collect();
        let mut dropped: Vec<String> = self
            .entries
            .keys()
            .filter(|path| !keep.contains(path.as_str()))
            .cloned()
            .collect();
        self.entries.retain(|path, _| keep.contains(path.as_str()));
        dropped.sort();
        dropped
    }
}

/// SHA-256 of a sequence of fields, returned as a hex string.
///
/// Fields are length-prefixed so `["ab", "c"]` and `["a", "bc"]` hash
/// differently.
pub fn hash_fields<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Summary of cache performance for a build run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} rendered ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} rendered", self.misses)
        }
    }
}

/// Resolve the cache file path for an output directory.
pub fn cache_path(output_dir: &Path) -> PathBuf {
    output_dir.join(CACHE_FILENAME)
}
