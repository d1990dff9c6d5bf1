//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Each page leads with
//! its positional index and title, with its source path and resolved fields
//! shown as indented context lines. The output reads as a content inventory
//! while still letting authors trace every page back to its file.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Pages
//! 001 Generic Cell Registration
//!     Source: _posts/2017-02-01-generic-cell-registration.md
//!     URL: 2017/02/01/generic-cell-registration.html
//!     Layout: post
//! 002 Untitled Draft
//!     Source: untitled-draft.md
//!     URL: untitled-draft.html
//!     Layout: default
//!     Front matter: malformed, defaults applied
//!     Title: from filename
//!
//! Skipped
//!     _drafts/wip.md (published: false)
//!
//! Config
//!     config.toml
//!     assets/
//! ```
//!
//! ## Generate
//!
//! ```text
//! Home → index.html (5 listed)
//! 001 Generic Cell Registration → 2017/02/01/generic-cell-registration.html
//! 002 About → about.html (cached)
//!
//! Generated 2 pages (1 cached, 1 rendered (2 total)), 1 asset
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O beyond existence checks, no side effects.

use crate::config::CONFIG_FILENAME;
use crate::frontmatter::{BlockState, FrontMatter};
use crate::generate::{GenerateReport, RenderStatus};
use crate::metadata::TitleSource;
use crate::scan::{INDEX_URL, Manifest};
use crate::types::Page;
use serde::Serialize;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn block_note(block: BlockState) -> Option<&'static str> {
    match block {
        BlockState::Present => None,
        BlockState::Missing => Some("none"),
        BlockState::Malformed => Some("malformed, defaults applied"),
    }
}

fn title_note(source: TitleSource) -> Option<&'static str> {
    match source {
        TitleSource::FrontMatter => None,
        TitleSource::Heading => Some("from first heading"),
        TitleSource::Filename => Some("from filename"),
        TitleSource::Default => Some("default"),
    }
}

/// Problems worth an author's attention for one page.
fn page_issues(page: &Page) -> Vec<String> {
    let mut issues = Vec::new();
    if page.block == BlockState::Malformed {
        issues.push("malformed front matter, defaults applied".to_string());
    }
    if page.title_source == TitleSource::Default {
        issues.push(format!("no title found, using \"{}\"", page.title));
    }
    issues
}

// ============================================================================
// Stage 1: Scan output
// ============================================================================

/// Format scan stage output showing every discovered page.
pub fn format_scan_output(manifest: &Manifest, source_root: &Path) -> Vec<String> {
    let mut lines = vec!["Pages".to_string()];

    for (i, page) in manifest.pages.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), page.title));
        lines.push(format!("    Source: {}", page.source_path));
        lines.push(format!("    URL: {}", page.url));
        let listing = if page.in_index() { "" } else { " (not listed)" };
        lines.push(format!("    Layout: {}{}", page.layout, listing));
        if let Some(note) = block_note(page.block) {
            lines.push(format!("    Front matter: {note}"));
        }
        if let Some(note) = title_note(page.title_source) {
            lines.push(format!("    Title: {note}"));
        }
    }

    if !manifest.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for doc in &manifest.skipped {
            lines.push(format!("    {} ({})", doc.source_path, doc.reason));
        }
    }

    lines.push(String::new());
    lines.push("Config".to_string());
    if source_root.join(CONFIG_FILENAME).exists() {
        lines.push(format!("    {CONFIG_FILENAME}"));
    }
    let assets_dir = &manifest.config.content.assets_dir;
    if source_root.join(assets_dir).is_dir() {
        lines.push(format!("    {assets_dir}/"));
    }

    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(manifest: &Manifest, source_root: &Path) {
    for line in format_scan_output(manifest, source_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Generate output
// ============================================================================

/// Format generate stage output: each page with its output path.
pub fn format_generate_output(report: &GenerateReport) -> Vec<String> {
    let mut lines = vec![format!("Home → {INDEX_URL} ({} listed)", report.indexed)];

    for (i, page) in report.pages.iter().enumerate() {
        let status = match page.status {
            RenderStatus::Cached => " (cached)",
            RenderStatus::Rendered => "",
        };
        lines.push(format!(
            "{} {} → {}{}",
            format_index(i + 1),
            page.title,
            page.url,
            status
        ));
    }
    for url in &report.removed {
        lines.push(format!("    Removed {url}"));
    }

    lines.push(String::new());
    let mut summary = format!(
        "Generated {} ({})",
        plural(report.pages.len(), "page", "pages"),
        report.cache
    );
    if report.assets_copied > 0 {
        summary.push_str(&format!(
            ", {}",
            plural(report.assets_copied, "asset", "assets")
        ));
    }
    lines.push(summary);
    lines
}

/// Print generate output to stdout.
pub fn print_generate_output(report: &GenerateReport) {
    for line in format_generate_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format the `check` report: degraded pages, then a one-line summary.
///
/// Returns the lines and the number of issues found.
pub fn format_check_output(manifest: &Manifest) -> (Vec<String>, usize) {
    let mut lines = Vec::new();
    let mut count = 0;

    for page in &manifest.pages {
        for issue in page_issues(page) {
            lines.push(format!("{}: {}", page.source_path, issue));
            count += 1;
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "{} checked, {} skipped, {}",
        plural(manifest.pages.len(), "page", "pages"),
        manifest.skipped.len(),
        plural(count, "issue", "issues")
    ));
    (lines, count)
}

/// Print check output to stdout, returning the issue count.
pub fn print_check_output(manifest: &Manifest) -> usize {
    let (lines, count) = format_check_output(manifest);
    for line in lines {
        println!("{}", line);
    }
    count
}

// ============================================================================
// Inspect output
// ============================================================================

#[derive(Serialize)]
struct Inspection<'a> {
    block: BlockState,
    front_matter: &'a FrontMatter,
}

/// Format a single parsed document: front matter as JSON, then the body.
pub fn format_inspect_output(
    front_matter: &FrontMatter,
    block: BlockState,
    body: &str,
) -> Result<Vec<String>, serde_json::Error> {
    let json = serde_json::to_string_pretty(&Inspection {
        block,
        front_matter,
    })?;
    let mut lines: Vec<String> = json.lines().map(String::from).collect();
    lines.push(String::new());
    lines.push("Body".to_string());
    lines.extend(body.lines().map(|l| format!("    {l}")));
    Ok(lines)
}

/// Print inspect output to stdout.
pub fn print_inspect_output(
    front_matter: &FrontMatter,
    block: BlockState,
    body: &str,
) -> Result<(), serde_json::Error> {
    for line in format_inspect_output(front_matter, block, body)? {
        println!("{}", line);
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStats;
    use crate::frontmatter;
    use crate::generate::GeneratedPage;
    use crate::scan::scan;
    use crate::test_helpers::setup_fixtures;

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "page", "pages"), "1 page");
        assert_eq!(plural(0, "page", "pages"), "0 pages");
    }

    // =========================================================================
    // Scan output
    // =========================================================================

    #[test]
    fn scan_output_lists_pages_in_order() {
        let tmp = setup_fixtures();
        let manifest = scan(tmp.path()).unwrap();
        let lines = format_scan_output(&manifest, tmp.path());

        assert_eq!(lines[0], "Pages");
        assert_eq!(lines[1], "001 Generic Cell Registration");
        assert_eq!(
            lines[2],
            "    Source: _posts/2017-02-01-generic-cell-registration.md"
        );
        assert_eq!(lines[3], "    URL: 2017/02/01/generic-cell-registration.html");
    }

    #[test]
    fn scan_output_notes_degraded_pages() {
        let tmp = setup_fixtures();
        let manifest = scan(tmp.path()).unwrap();
        let lines = format_scan_output(&manifest, tmp.path());

        assert!(lines.contains(&"    Front matter: malformed, defaults applied".to_string()));
        assert!(lines.contains(&"    Title: from first heading".to_string()));
        assert!(lines.contains(&"    Layout: page (not listed)".to_string()));
    }

    #[test]
    fn scan_output_shows_skipped_and_config() {
        let tmp = setup_fixtures();
        let manifest = scan(tmp.path()).unwrap();
        let lines = format_scan_output(&manifest, tmp.path());

        let skipped = lines.iter().position(|l| l == "Skipped").unwrap();
        assert_eq!(
            lines[skipped + 1],
            "    _drafts/wip-appearance-proxy.md (published: false)"
        );
        let config = lines.iter().position(|l| l == "Config").unwrap();
        assert_eq!(lines[config + 1], "    config.toml");
        assert_eq!(lines[config + 2], "    assets/");
    }

    // =========================================================================
    // Generate output
    // =========================================================================

    fn report() -> GenerateReport {
        GenerateReport {
            pages: vec![
                GeneratedPage {
                    title: "Nav Bars".to_string(),
                    url: "2016/05/12/nav-bars.html".to_string(),
                    status: RenderStatus::Rendered,
                },
                GeneratedPage {
                    title: "About".to_string(),
                    url: "about.html".to_string(),
                    status: RenderStatus::Cached,
                },
            ],
            indexed: 1,
            assets_copied: 1,
            removed: Vec::new(),
            cache: CacheStats { hits: 1, misses: 1 },
        }
    }

    #[test]
    fn generate_output_lines() {
        let lines = format_generate_output(&report());
        assert_eq!(
            lines,
            vec![
                "Home → index.html (1 listed)",
                "001 Nav Bars → 2016/05/12/nav-bars.html",
                "002 About → about.html (cached)",
                "",
                "Generated 2 pages (1 cached, 1 rendered (2 total)), 1 asset",
            ]
        );
    }

    #[test]
    fn generate_output_omits_zero_assets() {
        let mut r = report();
        r.assets_copied = 0;
        let lines = format_generate_output(&r);
        assert!(!lines.last().unwrap().contains("asset"));
    }

    #[test]
    fn generate_output_lists_removed_pages() {
        let mut r = report();
        r.removed = vec!["secret.html".to_string()];
        let lines = format_generate_output(&r);
        assert_eq!(lines[3], "    Removed secret.html");
        assert_eq!(lines[4], "");
    }

    // =========================================================================
    // Check output
    // =========================================================================

    #[test]
    fn check_reports_malformed_fixture() {
        let tmp = setup_fixtures();
        let manifest = scan(tmp.path()).unwrap();
        let (lines, count) = format_check_output(&manifest);

        assert_eq!(count, 1);
        assert_eq!(
            lines[0],
            "untitled-draft.md: malformed front matter, defaults applied"
        );
        assert_eq!(lines.last().unwrap(), "6 pages checked, 1 skipped, 1 issue");
    }

    // =========================================================================
    // Inspect output
    // =========================================================================

    #[test]
    fn inspect_prints_json_then_body() {
        let raw = "---\nlayout: post\ntitle: Blogging Like a Hacker\n---\nHello\nWorld";
        let (fm, body, block) = frontmatter::split_with_state(raw);
        let lines = format_inspect_output(&fm, block, body).unwrap();

        let body_at = lines.iter().position(|l| l == "Body").unwrap();
        let json: serde_json::Value = serde_json::from_str(&lines[..body_at].join("\n")).unwrap();
        assert_eq!(json["block"], "present");
        assert_eq!(json["front_matter"]["layout"], "post");
        assert_eq!(json["front_matter"]["title"], "Blogging Like a Hacker");
        assert_eq!(&lines[body_at + 1..], &["    Hello", "    World"]);
    }
}
