//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the content root and is layered over stock defaults: a user file only
//! needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "Blog"            # Shown in the header and the index <title>
//! description = ""          # Shown under the title on the index page
//! base_url = "/"            # Prefix for every generated link
//!
//! [defaults]
//! layout = "default"        # Layout for documents without a `layout` key
//! title = "Untitled"        # Title when nothing else provides one
//!
//! [content]
//! extensions = ["md", "markdown", "txt"]
//! exclude = []              # File or directory names to skip
//! assets_dir = "assets"     # Copied verbatim to the output root
//!
//! [colors.light]
//! background = "#ffffff"
//! text = "#111111"
//! text_muted = "#666666"    # Dates, footers
//! border = "#e0e0e0"
//! link = "#0b57d0"
//! link_hover = "#083d91"
//! code_background = "#f5f5f5"
//!
//! [colors.dark]
//! background = "#0a0a0a"
//! ...
//!
//! [processing]
//! max_threads = 4           # Optional, defaults to CPU cores
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override only the values you want to change.
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file inside the content root.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site-wide metadata used by the layouts.
    pub site: SiteMeta,
    /// Fallbacks for documents whose front matter is missing or incomplete.
    pub defaults: DefaultsConfig,
    /// Which files are documents and which are skipped.
    pub content: ContentConfig,
    /// Color schemes for light and dark modes.
    pub colors: ColorConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "content.extensions must not be empty".into(),
            ));
        }
        if self
            .content
            .extensions
            .iter()
            .any(|e| e.is_empty() || e.starts_with('.'))
        {
            return Err(ConfigError::Validation(
                "content.extensions entries are bare extensions like \"md\"".into(),
            ));
        }
        if self.defaults.layout.trim().is_empty() {
            return Err(ConfigError::Validation(
                "defaults.layout must not be empty".into(),
            ));
        }
        if !(self.site.base_url.starts_with('/') || self.site.base_url.starts_with("http")) {
            return Err(ConfigError::Validation(
                "site.base_url must start with '/' or 'http'".into(),
            ));
        }
        if self.content.assets_dir.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "content.assets_dir must be a single directory name".into(),
            ));
        }
        Ok(())
    }

    /// Whether a file extension marks a content document (case-insensitive).
    pub fn is_document_extension(&self, ext: &str) -> bool {
        self.content
            .extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Site-wide metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteMeta {
    /// Site title shown in every page header.
    pub title: String,
    /// Short description shown on the index page.
    pub description: String,
    /// Prefix for generated links, e.g. `/` or `/blog/`.
    pub base_url: String,
}

impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            description: String::new(),
            base_url: "/".to_string(),
        }
    }
}

impl SiteMeta {
    /// Join `base_url` and a site-relative path without doubling slashes.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            format!("{base}/")
        } else {
            format!("{base}/{path}")
        }
    }
}

/// Defaults applied when a document's front matter does not say otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    pub layout: String,
    pub title: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            layout: "default".to_string(),
            title: "Untitled".to_string(),
        }
    }
}

/// Content discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// File extensions (without dot) treated as documents.
    pub extensions: Vec<String>,
    /// File or directory names skipped anywhere in the tree.
    pub exclude: Vec<String>,
    /// Directory (relative to the content root) copied to the output root.
    pub assets_dir: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["md".into(), "markdown".into(), "txt".into()],
            exclude: Vec::new(),
            assets_dir: "assets".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of worker threads for parsing and rendering.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, at least 1
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_threads
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    /// Light mode color scheme.
    pub light: ColorScheme,
    /// Dark mode color scheme.
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

/// Individual color scheme (light or dark).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    pub background: String,
    pub text: String,
    /// Secondary text: post dates, footers.
    pub text_muted: String,
    pub border: String,
    pub link: String,
    pub link_hover: String,
    /// Background behind code blocks.
    pub code_background: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#111111".to_string(),
            text_muted: "#666666".to_string(),
            border: "#e0e0e0".to_string(),
            link: "#0b57d0".to_string(),
            link_hover: "#083d91".to_string(),
            code_background: "#f5f5f5".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#0a0a0a".to_string(),
            text: "#eeeeee".to_string(),
            text_muted: "#999999".to_string(),
            border: "#333333".to_string(),
            link: "#8ab4f8".to_string(),
            link_hover: "#c2d7fb".to_string(),
            code_background: "#1a1a1a".to_string(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist, `Err` if it is not valid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let overlay = load_raw_config(root)?;
    if overlay.is_some() {
        tracing::debug!(path = %root.join(CONFIG_FILENAME).display(), "loaded site config");
    }
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Press Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file at the root of the content directory.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site metadata
# ---------------------------------------------------------------------------
[site]
# Shown in every page header and as the index page <title>.
title = "Blog"

# Shown under the title on the index page. Empty hides it.
description = ""

# Prefix for every generated link. Use "/blog/" when the site is not
# served from the domain root.
base_url = "/"

# ---------------------------------------------------------------------------
# Defaults for documents with missing or malformed front matter
# ---------------------------------------------------------------------------
[defaults]
# Layout used when a document has no `layout` key.
# Built-in layouts: "default", "post", "page".
layout = "default"

# Title used when neither front matter, a "# heading", nor the filename
# provides one.
title = "Untitled"

# ---------------------------------------------------------------------------
# Content discovery
# ---------------------------------------------------------------------------
[content]
# File extensions (without the dot) treated as documents.
extensions = ["md", "markdown", "txt"]

# File or directory names skipped anywhere in the content tree.
exclude = []

# Directory copied verbatim to the output root (images, favicon, ...).
assets_dir = "assets"

# ---------------------------------------------------------------------------
# Colors - Light mode (prefers-color-scheme: light)
# ---------------------------------------------------------------------------
[colors.light]
background = "#ffffff"
text = "#111111"
text_muted = "#666666"    # Dates, footers
border = "#e0e0e0"
link = "#0b57d0"
link_hover = "#083d91"
code_background = "#f5f5f5"

# ---------------------------------------------------------------------------
# Colors - Dark mode (prefers-color-scheme: dark)
# ---------------------------------------------------------------------------
[colors.dark]
background = "#0a0a0a"
text = "#eeeeee"
text_muted = "#999999"
border = "#333333"
link = "#8ab4f8"
link_hover = "#c2d7fb"
code_background = "#1a1a1a"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum worker threads for parsing and rendering.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_threads = 4
"##
}

/// Generate CSS custom properties from color config.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        r#":root {{
    --color-bg: {light_bg};
    --color-text: {light_text};
    --color-text-muted: {light_text_muted};
    --color-border: {light_border};
    --color-link: {light_link};
    --color-link-hover: {light_link_hover};
    --color-code-bg: {light_code_bg};
}}

@media (prefers-color-scheme: dark) {{
    :root {{
        --color-bg: {dark_bg};
        --color-text: {dark_text};
        --color-text-muted: {dark_text_muted};
        --color-border: {dark_border};
        --color-link: {dark_link};
        --color-link-hover: {dark_link_hover};
        --color-code-bg: {dark_code_bg};
    }}
}}"#,
        light_bg = colors.light.background,
        light_text = colors.light.text,
        light_text_muted = colors.light.text_muted,
        light_border = colors.light.border,
        light_link = colors.light.link,
        light_link_hover = colors.light.link_hover,
        light_code_bg = colors.light.code_background,
        dark_bg = colors.dark.background,
        dark_text = colors.dark.text,
        dark_text_muted = colors.dark.text_muted,
        dark_border = colors.dark.border,
        dark_link = colors.dark.link,
        dark_link_hover = colors.dark.link_hover,
        dark_code_bg = colors.dark.code_background,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = SiteConfig::default();
        assert_eq!(config.site.title, "Blog");
        assert_eq!(config.site.base_url, "/");
        assert_eq!(config.defaults.layout, "default");
        assert_eq!(config.defaults.title, "Untitled");
        assert_eq!(config.content.extensions, vec!["md", "markdown", "txt"]);
        assert_eq!(config.content.assets_dir, "assets");
        assert_eq!(config.colors.light.background, "#ffffff");
        assert_eq!(config.colors.dark.background, "#0a0a0a");
        assert_eq!(config.processing.max_threads, None);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[site]
title = "iOS UI Tips"

[colors.light]
background = "#fafafa"
"##;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.site.title, "iOS UI Tips");
        assert_eq!(config.colors.light.background, "#fafafa");
        // Defaults preserved
        assert_eq!(config.site.base_url, "/");
        assert_eq!(config.colors.light.text, "#111111");
        assert_eq!(config.defaults.layout, "default");
    }

    #[test]
    fn is_document_extension_ignores_case() {
        let config = SiteConfig::default();
        assert!(config.is_document_extension("md"));
        assert!(config.is_document_extension("MD"));
        assert!(config.is_document_extension("Markdown"));
        assert!(!config.is_document_extension("html"));
    }

    #[test]
    fn url_for_joins_without_double_slashes() {
        let mut site = SiteMeta::default();
        assert_eq!(site.url_for(""), "/");
        assert_eq!(site.url_for("about.html"), "/about.html");
        site.base_url = "/blog/".to_string();
        assert_eq!(site.url_for("/2016/05/12/post.html"), "/blog/2016/05/12/post.html");
        assert_eq!(site.url_for(""), "/blog/");
        site.base_url = "https://example.com".to_string();
        assert_eq!(site.url_for("a.html"), "https://example.com/a.html");
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.site.title, "Blog");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[defaults]
layout = "post"

[content]
exclude = ["drafts"]
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.defaults.layout, "post");
        assert_eq!(config.defaults.title, "Untitled");
        assert_eq!(config.content.exclude, vec!["drafts"]);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not valid toml [[[").unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[content]
extensions = []
"#,
        )
        .unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[defaults]
layuot = "post"
"#,
        )
        .unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_dotted_extension() {
        let mut config = SiteConfig::default();
        config.content.extensions = vec![".md".into()];
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_blank_default_layout() {
        let mut config = SiteConfig::default();
        config.defaults.layout = "  ".into();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_relative_base_url() {
        let mut config = SiteConfig::default();
        config.site.base_url = "blog/".into();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_nested_assets_dir() {
        let mut config = SiteConfig::default();
        config.content.assets_dir = "static/assets".into();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[site]\ntitel = \"x\"\n");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[images]\nquality = 90\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"layout = "default""#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"layout = "post""#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("layout").unwrap().as_str(), Some("post"));
    }

    #[test]
    fn merge_toml_deep_nested() {
        let base: toml::Value = toml::from_str(
            r##"
[colors.light]
background = "#fff"
text = "#000"
"##,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r##"
[colors.light]
background = "#fafafa"
"##,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let light = merged.get("colors").unwrap().get("light").unwrap();
        assert_eq!(light.get("background").unwrap().as_str(), Some("#fafafa"));
        assert_eq!(light.get("text").unwrap().as_str(), Some("#000"));
    }

    #[test]
    fn merge_toml_arrays_replace() {
        let base: toml::Value = toml::from_str(r#"extensions = ["md", "txt"]"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"extensions = ["md"]"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("extensions").unwrap().as_array().unwrap().len(), 1);
    }

    // =========================================================================
    // Processing tests
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig { max_threads: None }), cores);
        assert_eq!(
            effective_threads(&ProcessingConfig {
                max_threads: Some(99999)
            }),
            cores
        );
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_threads: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_zero_means_one() {
        let config = ProcessingConfig {
            max_threads: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // CSS and stock config tests
    // =========================================================================

    #[test]
    fn generate_css_uses_config_colors() {
        let mut colors = ColorConfig::default();
        colors.light.background = "#f0f0f0".to_string();
        colors.dark.code_background = "#222222".to_string();

        let css = generate_color_css(&colors);
        assert!(css.contains("--color-bg: #f0f0f0"));
        assert!(css.contains("--color-code-bg: #222222"));
        assert!(css.contains("@media (prefers-color-scheme: dark)"));
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = SiteConfig::default();
        assert_eq!(config.site.title, defaults.site.title);
        assert_eq!(config.defaults.layout, defaults.defaults.layout);
        assert_eq!(config.content.extensions, defaults.content.extensions);
        assert_eq!(config.colors.light.link, defaults.colors.light.link);
        assert_eq!(
            config.colors.dark.code_background,
            defaults.colors.dark.code_background
        );
        assert_eq!(config.processing.max_threads, None);
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value();
        assert!(val.is_table());
        for section in ["site", "defaults", "content", "colors", "processing"] {
            assert!(val.get(section).is_some(), "missing section {section}");
        }
    }
}
