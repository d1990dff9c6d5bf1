//! Document metadata resolution.
//!
//! Each page field can come from several places. The front-matter block is
//! the author's explicit choice and always wins; the body and the filename
//! are mechanical fallbacks; the site config supplies the final default so
//! a document with no usable metadata still publishes.
//!
//! ## Resolution priority
//!
//! Each field is resolved independently. The first non-empty value wins:
//!
//! - **Title**: front-matter `title` → first `# heading` → filename → `defaults.title`
//! - **Layout**: front-matter `layout` → `defaults.layout`
//! - **Date**: front-matter `date` → filename date → none
//!
//! A front-matter `date` that does not parse is ignored (with a warning from
//! the scan stage), falling back to the filename date.

use crate::config::DefaultsConfig;
use crate::frontmatter::FrontMatter;
use crate::naming::{ParsedName, PostDate};
use serde::{Deserialize, Serialize};

/// Resolve a metadata field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value, trimmed.
///
/// ```text
/// title:  resolve(&[front_matter_title, heading, filename_title])
/// layout: resolve(&[front_matter_layout])
/// ```
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// Where a page's title came from. Reported by `check` so authors can see
/// which documents fell back to defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleSource {
    FrontMatter,
    Heading,
    Filename,
    Default,
}

/// Fields resolved for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMeta {
    pub title: String,
    pub title_source: TitleSource,
    pub layout: String,
    pub date: Option<PostDate>,
    /// False when front matter says `published: false`.
    pub published: bool,
    /// A front-matter `date` value that could not be parsed.
    pub invalid_date: Option<String>,
}

/// Resolve title, layout, date and publish state for a document.
pub fn resolve_document(
    name: &ParsedName,
    front_matter: &FrontMatter,
    body: &str,
    defaults: &DefaultsConfig,
) -> ResolvedMeta {
    let heading = first_heading(body);
    let (title, title_source) = [
        (front_matter.title(), TitleSource::FrontMatter),
        (heading, TitleSource::Heading),
        (Some(name.display_title.as_str()), TitleSource::Filename),
    ]
    .into_iter()
    .find_map(|(value, source)| resolve(&[value]).map(|t| (t, source)))
    .unwrap_or_else(|| (defaults.title.clone(), TitleSource::Default));

    let layout = resolve(&[front_matter.layout()]).unwrap_or_else(|| defaults.layout.clone());

    let (fm_date, invalid_date) = match front_matter.get("date").map(str::trim) {
        Some(raw) if !raw.is_empty() => match raw.parse::<PostDate>() {
            Ok(date) => (Some(date), None),
            Err(_) => (None, Some(raw.to_string())),
        },
        _ => (None, None),
    };

    let published = !front_matter
        .get("published")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("false"));

    ResolvedMeta {
        title,
        title_source,
        layout,
        date: fm_date.or(name.date),
        published,
        invalid_date,
    }
}

/// First ATX level-1 heading (`# Title`) outside fenced code blocks.
pub fn first_heading(body: &str) -> Option<&str> {
    let mut fence: Option<&str> = None;
    for line in body.lines() {
        let trimmed = line.trim_start();
        if let Some(open) = fence {
            if trimmed.starts_with(open) {
                fence = None;
            }
            continue;
        }
        if trimmed.starts_with("```") {
            fence = Some("```");
            continue;
        }
        if trimmed.starts_with("~~~") {
            fence = Some("~~~");
            continue;
        }
        if let Some(heading) = line.strip_prefix("# ") {
            let heading = heading.trim().trim_end_matches('#').trim_end();
            if !heading.is_empty() {
                return Some(heading);
            }
        }
    }
    None
}

const MAX_SLUG_LEN: usize = 80;

/// Sanitize a name for use in URLs and filenames.
///
/// - Lowercases ASCII letters
/// - Replaces non-alphanumeric characters (except dashes) with dashes
/// - Collapses consecutive dashes into one
/// - Strips leading and trailing dashes
/// - Truncates to `MAX_SLUG_LEN` characters (breaks at last dash before limit)
pub fn sanitize_slug(title: &str) -> String {
    let slug: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();

    let mut collapsed = String::with_capacity(slug.len());
    let mut prev_dash = false;
    for c in slug.chars() {
        if c == '-' {
            if !prev_dash {
                collapsed.push('-');
            }
            prev_dash = true;
        } else {
            collapsed.push(c);
            prev_dash = false;
        }
    }

    let trimmed = collapsed.trim_matches('-');

    if trimmed.len() <= MAX_SLUG_LEN {
        trimmed.to_string()
    } else {
        let truncated = &trimmed[..MAX_SLUG_LEN];
        match truncated.rfind('-') {
            Some(pos) => truncated[..pos].to_string(),
            None => truncated.to_string(),
        }
    }
}
