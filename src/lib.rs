//! # Simple Press
//!
//! A small static site generator for blogs and notes. The content directory
//! is the data source: each text document carries an optional front-matter
//! block naming its layout and title, dated filenames become posts, and
//! everything else becomes a page.
//!
//! # Front Matter
//!
//! ```text
//! ---
//! layout: post
//! title: Blogging Like a Hacker
//! ---
//! Body text, passed through untouched.
//! ```
//!
//! The [`frontmatter`] module splits this block from the body. It never
//! fails: a document with no block, or with one it cannot read, keeps its
//! full text as the body and gets the configured default title and layout.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! ```text
//! 1. Scan      content/  →  manifest.json    (filesystem → structured data)
//! 2. Generate  manifest  →  dist/            (final HTML site)
//! ```
//!
//! The manifest is human-readable JSON, so the result of scanning can be
//! inspected before anything is rendered, and each stage can be tested on
//! its own.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`frontmatter`] | Front-matter block parsing and serialization |
//! | [`naming`] | `YYYY-MM-DD-slug` and `NNN-slug` filename conventions |
//! | [`metadata`] | Title, layout and date resolution with fallbacks |
//! | [`scan`] | Stage 1: walks the content directory, produces the manifest |
//! | [`generate`] | Stage 2: renders the site from the manifest |
//! | [`render`] | `PageRenderer` trait and the maud/pulldown-cmark templates |
//! | [`cache`] | Content-hash render cache for incremental builds |
//! | [`config`] | `config.toml` loading, validation, merging, and CSS generation |
//! | [`types`] | Shared types serialized between stages (`Page`) |
//! | [`output`] | CLI output formatting for each command |
//!
//! # Design Decisions
//!
//! ## Degrade, Don't Fail
//!
//! Authors edit content by hand. A typo in one header should not take the
//! whole site down, so front-matter problems only produce a warning and a
//! page with default metadata. Hard errors are reserved for things that
//! would produce a wrong site: unreadable files, an invalid `config.toml`,
//! and two documents claiming the same URL.
//!
//! ## Flat Front Matter
//!
//! Headers are YAML mappings read with `serde_yaml`, but only the top level
//! is kept. Lists of scalars are collapsed to a comma-separated value and
//! nested mappings are dropped. Values are kept as strings and interpreted
//! by the code that reads them.

pub mod cache;
pub mod config;
pub mod frontmatter;
pub mod generate;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod render;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
