//! Page templates and markdown rendering.
//!
//! The generate stage only knows about the [`PageRenderer`] trait; this
//! module provides the production implementation, [`MaudRenderer`], built
//! on [maud](https://maud.lambda.xyz/) for compile-time HTML templating and
//! [pulldown-cmark](https://docs.rs/pulldown-cmark) for document bodies.
//!
//! ## Layouts
//!
//! | Layout    | Shows date | Listed on index |
//! |-----------|------------|-----------------|
//! | `default` | no         | yes             |
//! | `post`    | yes        | yes             |
//! | `page`    | no         | no              |
//!
//! A layout name with no template renders with `default`.
//!
//! ## Escaping
//!
//! Titles, dates and site metadata go through maud and are HTML-escaped.
//! Document bodies are markdown and may contain raw HTML, which is passed
//! through as the author wrote it.

use crate::config::SiteMeta;
use crate::metadata::TitleSource;
use crate::types::Page;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Options, Parser, html as md_html};

/// Everything a template needs besides the page itself.
#[derive(Debug, Clone)]
pub struct SiteContext {
    pub meta: SiteMeta,
    /// Full stylesheet, inlined into every page.
    pub css: String,
}

/// Turns pages into HTML documents.
///
/// Implementations must be `Sync` so pages can render on the rayon pool.
pub trait PageRenderer: Sync {
    /// Render a single page as a complete HTML document.
    fn render_page(&self, page: &Page, site: &SiteContext) -> String;

    /// Render the index listing for the given pages, already in display order.
    fn render_index(&self, pages: &[&Page], site: &SiteContext) -> String;
}

/// Named templates a page can ask for via its `layout` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Default,
    Post,
    Page,
}

impl Layout {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "default" => Some(Self::Default),
            "post" => Some(Self::Post),
            "page" => Some(Self::Page),
            _ => None,
        }
    }

    /// Template for `name`, falling back to [`Layout::Default`] with a warning.
    pub fn resolve(name: &str, source_path: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            tracing::warn!(layout = name, path = source_path, "unknown layout; using default");
            Self::Default
        })
    }

    fn css_class(self) -> &'static str {
        match self {
            Self::Default => "layout-default",
            Self::Post => "layout-post",
            Self::Page => "layout-page",
        }
    }
}

/// Production renderer.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaudRenderer;

impl PageRenderer for MaudRenderer {
    fn render_page(&self, page: &Page, site: &SiteContext) -> String {
        render_page(page, site).into_string()
    }

    fn render_index(&self, pages: &[&Page], site: &SiteContext) -> String {
        render_index(pages, site).into_string()
    }
}

/// Render a markdown body to HTML.
///
/// Tables, footnotes, strikethrough and task lists are enabled. Fenced code
/// is emitted as `<pre><code class="language-x">` without highlighting.
pub fn markdown_to_html(body: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(body, options);
    let mut out = String::with_capacity(body.len() * 3 / 2);
    md_html::push_html(&mut out, parser);
    out
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(
    title: &str,
    site: &SiteContext,
    body_class: Option<&str>,
    content: Markup,
) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                @if !site.meta.description.is_empty() {
                    meta name="description" content=(site.meta.description);
                }
                title { (title) }
                style { (PreEscaped(&site.css)) }
            }
            body class=[body_class] {
                (site_header(&site.meta))
                (content)
            }
        }
    }
}

/// Renders the site header linking back to the index
fn site_header(meta: &SiteMeta) -> Markup {
    html! {
        header.site-header {
            a.site-title href=(meta.url_for("")) { (meta.title) }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

fn render_page(page: &Page, site: &SiteContext) -> Markup {
    let layout = Layout::resolve(&page.layout, &page.source_path);
    let body_html = markdown_to_html(&page.body);
    // A title taken from the body's heading is already in the body.
    let show_heading = page.title_source != TitleSource::Heading;
    let date = match layout {
        Layout::Post => page.date,
        Layout::Default | Layout::Page => None,
    };

    let content = html! {
        main {
            article class=(layout.css_class()) {
                @if show_heading || date.is_some() {
                    header {
                        @if show_heading {
                            h1 { (page.title) }
                        }
                        @if let Some(date) = date {
                            time.post-date datetime=(date.to_string()) { (date.to_string()) }
                        }
                    }
                }
                div.page-body {
                    (PreEscaped(body_html))
                }
            }
        }
    };

    let doc_title = format!("{} · {}", page.title, site.meta.title);
    base_document(&doc_title, site, None, content)
}

fn render_index(pages: &[&Page], site: &SiteContext) -> Markup {
    let content = html! {
        main.index-page {
            @if !site.meta.description.is_empty() {
                p.site-description { (site.meta.description) }
            }
            ul.post-list {
                @for page in pages {
                    li {
                        @if let Some(date) = page.date {
                            time datetime=(date.to_string()) { (date.to_string()) }
                        }
                        a href=(site.meta.url_for(&page.url)) { (page.title) }
                    }
                }
            }
        }
    };

    base_document(&site.meta.title, site, Some("index"), content)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::{BlockState, FrontMatter};
    use crate::naming::PostDate;

    fn site() -> SiteContext {
        SiteContext {
            meta: SiteMeta {
                title: "iOS UI Tips".to_string(),
                description: "Small notes".to_string(),
                base_url: "/".to_string(),
            },
            css: "body { margin: 0; }".to_string(),
        }
    }

    fn page(layout: &str, title: &str, body: &str) -> Page {
        Page {
            title: title.to_string(),
            title_source: TitleSource::FrontMatter,
            layout: layout.to_string(),
            slug: "nav-bars".to_string(),
            url: "2016/05/12/nav-bars.html".to_string(),
            source_path: "_posts/2016-05-12-nav-bars.md".to_string(),
            date: PostDate::new(2016, 5, 12),
            number: None,
            front_matter: FrontMatter::new(),
            block: BlockState::Present,
            body: body.to_string(),
        }
    }

    // =========================================================================
    // Layouts
    // =========================================================================

    #[test]
    fn layout_names_resolve() {
        assert_eq!(Layout::from_name("post"), Some(Layout::Post));
        assert_eq!(Layout::from_name(" Page "), Some(Layout::Page));
        assert_eq!(Layout::from_name("default"), Some(Layout::Default));
        assert_eq!(Layout::from_name("gallery"), None);
    }

    #[test]
    fn unknown_layout_falls_back_to_default() {
        assert_eq!(Layout::resolve("gallery", "x.md"), Layout::Default);
    }

    #[test]
    fn post_layout_shows_date() {
        let html = MaudRenderer.render_page(&page("post", "Nav Bars", "Text"), &site());
        assert!(html.contains(r#"<time class="post-date" datetime="2016-05-12">2016-05-12</time>"#));
        assert!(html.contains("layout-post"));
    }

    #[test]
    fn default_layout_hides_date() {
        let html = MaudRenderer.render_page(&page("default", "Nav Bars", "Text"), &site());
        assert!(!html.contains("<time"));
        assert!(html.contains("layout-default"));
    }

    #[test]
    fn unknown_layout_renders_like_default() {
        let html = MaudRenderer.render_page(&page("gallery", "Nav Bars", "Text"), &site());
        assert!(html.contains("layout-default"));
        assert!(html.contains("<h1>Nav Bars</h1>"));
    }

    // =========================================================================
    // Page content
    // =========================================================================

    #[test]
    fn page_includes_title_and_css() {
        let html = MaudRenderer.render_page(&page("post", "Nav Bars", "Text"), &site());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Nav Bars · iOS UI Tips</title>"));
        assert!(html.contains("body { margin: 0; }"));
        assert!(html.contains(r#"<a class="site-title" href="/">iOS UI Tips</a>"#));
    }

    #[test]
    fn title_is_escaped() {
        let html = MaudRenderer.render_page(&page("post", "<script>alert(1)</script>", "x"), &site());
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn heading_title_is_not_repeated() {
        let mut p = page("default", "Localization Checklist", "# Localization Checklist\n\nItems");
        p.title_source = TitleSource::Heading;
        let html = MaudRenderer.render_page(&p, &site());
        assert_eq!(html.matches("<h1>").count(), 1);
    }

    // =========================================================================
    // Markdown
    // =========================================================================

    #[test]
    fn markdown_converts_emphasis() {
        let html = markdown_to_html("This is **bold** and *italic*.");
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
    }

    #[test]
    fn markdown_fenced_code_keeps_language_class() {
        let html = markdown_to_html("```swift\nlet x = 1 < 2\n```\n");
        assert!(html.contains(r#"<pre><code class="language-swift">"#));
        assert!(html.contains("let x = 1 &lt; 2"));
    }

    #[test]
    fn markdown_extensions_enabled() {
        let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n\n- [x] done\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains(r#"type="checkbox""#));
    }

    // =========================================================================
    // Index
    // =========================================================================

    #[test]
    fn index_lists_pages_with_links() {
        let a = page("post", "Nav Bars", "x");
        let mut b = page("default", "Checklist", "y");
        b.url = "notes/checklist.html".to_string();
        b.date = None;

        let html = MaudRenderer.render_index(&[&a, &b], &site());
        assert!(html.contains(r#"href="/2016/05/12/nav-bars.html""#));
        assert!(html.contains(r#"href="/notes/checklist.html""#));
        assert!(html.contains("<p class=\"site-description\">Small notes</p>"));
        assert_eq!(html.matches("<time").count(), 1);
        assert!(html.find("Nav Bars").unwrap() < html.find("Checklist").unwrap());
    }

    #[test]
    fn index_respects_base_url() {
        let mut s = site();
        s.meta.base_url = "/blog/".to_string();
        let p = page("post", "Nav Bars", "x");
        let html = MaudRenderer.render_index(&[&p], &s);
        assert!(html.contains(r#"href="/blog/2016/05/12/nav-bars.html""#));
        assert!(html.contains(r#"href="/blog/""#));
    }
}
