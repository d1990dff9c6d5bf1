//! HTML site generation.
//!
//! Stage 2 of the build pipeline. Reads the scan manifest and writes the
//! final static site.
//!
//! ## Generated Files
//!
//! - **Index page** (`/index.html`): every page not using the `page` layout,
//!   in display order. Always rewritten.
//! - **Content pages** (`/{url}`): one HTML file per scanned page.
//! - **Assets**: the content root's assets directory, copied verbatim to the
//!   output root. An asset may not share a path with a page, the index, or
//!   the render cache; that is an [`GenerateError::AssetCollision`].
//!
//! Outputs recorded in the render cache whose page is gone (deleted, renamed,
//! or `published: false`) are removed, along with directories left empty.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html
//! ├── about.html
//! ├── 2016/05/12/navigation-bar-theming.html
//! ├── notes/localization-checklist.html
//! ├── robots.txt                 # from content/assets/
//! └── .render-cache.json
//! ```
//!
//! Pages render in parallel on the rayon pool; each writes its own file.
//! Unchanged pages are skipped via the [render cache](crate::cache).

use crate::cache::{self, CacheStats, RenderCache};
use crate::config;
use crate::render::{MaudRenderer, PageRenderer, SiteContext};
use crate::scan::{INDEX_URL, Manifest};
use crate::types::Page;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Component, Path};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("Asset {path} would overwrite a generated file")]
    AssetCollision { path: String },
}

const CSS_STATIC: &str = include_str!("../static/style.css");

/// Whether a page was rendered this run or left in place from the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    Rendered,
    Cached,
}

/// One content page written (or kept) in the output directory.
#[derive(Debug, Clone)]
pub struct GeneratedPage {
    pub title: String,
    pub url: String,
    pub status: RenderStatus,
}

/// Summary of a generate run, consumed by [`crate::output`].
#[derive(Debug)]
pub struct GenerateReport {
    pub pages: Vec<GeneratedPage>,
    /// Number of pages listed on the index.
    pub indexed: usize,
    /// Number of files copied from the assets directory.
    pub assets_copied: usize,
    /// Outputs from an earlier run that no longer belong to any page.
    pub removed: Vec<String>,
    pub cache: CacheStats,
}

/// Full stylesheet: config colors as custom properties, then the base styles.
pub fn site_css(colors: &config::ColorConfig) -> String {
    format!("{}\n\n{}", config::generate_color_css(colors), CSS_STATIC)
}

/// Generate the site with the production renderer.
pub fn generate(
    manifest_path: &Path,
    source_root: &Path,
    output_dir: &Path,
    use_cache: bool,
) -> Result<GenerateReport, GenerateError> {
    generate_with_renderer(&MaudRenderer, manifest_path, source_root, output_dir, use_cache)
}

/// Generate the site with any [`PageRenderer`].
pub fn generate_with_renderer(
    renderer: &impl PageRenderer,
    manifest_path: &Path,
    source_root: &Path,
    output_dir: &Path,
    use_cache: bool,
) -> Result<GenerateReport, GenerateError> {
    let manifest_content = fs::read_to_string(manifest_path)?;
    let manifest: Manifest = serde_json::from_str(&manifest_content)?;

    let site = SiteContext {
        meta: manifest.config.site.clone(),
        css: site_css(&manifest.config.colors),
    };

    let assets_dir = source_root.join(&manifest.config.content.assets_dir);
    let assets = list_assets(&assets_dir)?;
    check_asset_collisions(&assets, &manifest.pages)?;

    fs::create_dir_all(output_dir)?;

    // Loaded even with the cache disabled: it records what earlier runs wrote.
    let mut render_cache = RenderCache::load(output_dir);

    let results: Vec<PageResult> = manifest
        .pages
        .par_iter()
        .map(|page| render_one(renderer, page, &site, &render_cache, output_dir, use_cache))
        .collect::<Result<_, _>>()?;

    let mut stats = CacheStats::default();
    let mut pages = Vec::with_capacity(results.len());
    for result in results {
        match result.page.status {
            RenderStatus::Cached => stats.hit(),
            RenderStatus::Rendered => stats.miss(),
        }
        render_cache.insert(result.page.url.clone(), result.source_hash, result.params_hash);
        pages.push(result.page);
    }
    let stale = render_cache.retain_outputs(pages.iter().map(|p| p.url.as_str()));
    let removed = remove_stale_outputs(output_dir, stale)?;

    let indexed: Vec<&Page> = manifest.indexed_pages().collect();
    let index_html = renderer.render_index(&indexed, &site);
    write_output(output_dir, INDEX_URL, &index_html)?;
    debug!(pages = indexed.len(), "wrote index");

    let assets_copied = copy_assets(&assets_dir, &assets, output_dir)?;

    render_cache.save(output_dir)?;

    info!(
        output = %output_dir.display(),
        pages = pages.len(),
        cache = %stats,
        assets = assets_copied,
        removed = removed.len(),
        "site generated"
    );

    Ok(GenerateReport {
        pages,
        indexed: indexed.len(),
        assets_copied,
        removed,
        cache: stats,
    })
}

struct PageResult {
    page: GeneratedPage,
    source_hash: String,
    params_hash: String,
}

fn render_one(
    renderer: &impl PageRenderer,
    page: &Page,
    site: &SiteContext,
    render_cache: &RenderCache,
    output_dir: &Path,
    use_cache: bool,
) -> Result<PageResult, GenerateError> {
    let source_hash = cache::hash_fields(
        page.front_matter
            .iter()
            .flat_map(|(key, value)| [key, value])
            .chain([page.body.as_str()]),
    );
    let params_hash = page_params_hash(page, site);

    let status = if use_cache
        && render_cache.is_fresh(&page.url, &source_hash, &params_hash, output_dir)
    {
        debug!(url = %page.url, "cache hit");
        RenderStatus::Cached
    } else {
        let html = renderer.render_page(page, site);
        write_output(output_dir, &page.url, &html)?;
        debug!(url = %page.url, layout = %page.layout, "rendered");
        RenderStatus::Rendered
    };

    Ok(PageResult {
        page: GeneratedPage {
            title: page.title.clone(),
            url: page.url.clone(),
            status,
        },
        source_hash,
        params_hash,
    })
}

/// Hash of every input besides the document text that shapes a page's HTML.
fn page_params_hash(page: &Page, site: &SiteContext) -> String {
    let date = page.date.map(|d| d.to_string()).unwrap_or_default();
    cache::hash_fields([
        env!("CARGO_PKG_VERSION"),
        page.title.as_str(),
        page.layout.as_str(),
        date.as_str(),
        page.url.as_str(),
        site.meta.title.as_str(),
        site.meta.description.as_str(),
        site.meta.base_url.as_str(),
        site.css.as_str(),
    ])
}

fn write_output(output_dir: &Path, url: &str, html: &str) -> Result<(), GenerateError> {
    let path = output_dir.join(url);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, html).map_err(|source| GenerateError::Write {
        path: url.to_string(),
        source,
    })
}

/// Files under the assets directory as `/`-separated paths relative to it,
/// the same form as page URLs.
fn list_assets(assets_dir: &Path) -> Result<Vec<String>, GenerateError> {
    if !assets_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut assets = Vec::new();
    for entry in WalkDir::new(assets_dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(assets_dir).unwrap_or(entry.path());
        let parts: Vec<_> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        assets.push(parts.join("/"));
    }
    Ok(assets)
}

fn check_asset_collisions(assets: &[String], pages: &[Page]) -> Result<(), GenerateError> {
    let generated: HashSet<&str> = pages
        .iter()
        .map(|p| p.url.as_str())
        .chain([INDEX_URL, cache::CACHE_FILENAME])
        .collect();
    match assets.iter().find(|asset| generated.contains(asset.as_str())) {
        Some(path) => Err(GenerateError::AssetCollision { path: path.clone() }),
        None => Ok(()),
    }
}

fn copy_assets(assets_dir: &Path, assets: &[String], output_dir: &Path) -> io::Result<usize> {
    for rel in assets {
        let dst = output_dir.join(rel);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(assets_dir.join(rel), &dst)?;
    }
    Ok(assets.len())
}

/// Delete outputs that belong to no page any more, then any directories the
/// deletions left empty. Returns the paths that were actually removed.
fn remove_stale_outputs(output_dir: &Path, stale: Vec<String>) -> io::Result<Vec<String>> {
    let mut removed = Vec::new();
    for url in stale {
        let rel = Path::new(&url);
        let inside = rel.components().next().is_some()
            && rel.components().all(|c| matches!(c, Component::Normal(_)));
        if !inside {
            warn!(path = %url, "ignoring render cache entry outside the output directory");
            continue;
        }

        let path = output_dir.join(rel);
        match fs::remove_file(&path) {
            Ok(()) => debug!(path = %url, "removed stale output"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => return Err(err),
        }

        let mut dir = path.parent();
        while let Some(d) = dir {
            if d == output_dir || fs::remove_dir(d).is_err() {
                break;
            }
            dir = d.parent();
        }
        removed.push(url);
    }
    Ok(removed)
}

// ============================================================================
// Tests
// ============================================================================
