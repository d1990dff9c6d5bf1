use clap::{Parser, Subcommand};
use simple_press::{config, frontmatter, generate, output, scan};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Shared flags for commands that render pages.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Disable the render cache and re-render every page
    #[arg(long)]
    no_cache: bool,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "simple-press")]
#[command(about = "Static site generator for blogs and notes")]
#[command(long_about = "\
Static site generator for blogs and notes

Each document may start with a front-matter block:

  ---
  layout: post
  title: Blogging Like a Hacker
  ---

Content structure:

  content/
  ├── config.toml                          # Site config (optional)
  ├── assets/                              # Copied verbatim to the output root
  ├── _posts/                              # `_` directories group files, not in URLs
  │   └── 2016-05-12-nav-bar-theming.md    # Dated post → 2016/05/12/nav-bar-theming.html
  ├── 010-about.md                         # Numbered page → about.html
  └── notes/localization.txt               # Plain document → notes/localization.html

Metadata resolution (first available wins):
  Title:   front matter → first # heading → filename → defaults.title
  Layout:  front matter → defaults.layout
  Date:    front matter → filename date

Documents with missing or malformed front matter are still published with
the defaults. Set `published: false` to leave a document out.

Run 'simple-press gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (manifest)
    #[arg(long, default_value = ".simple-press-temp", global = true)]
    temp_dir: PathBuf,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan content directory into a manifest
    Scan,
    /// Produce the HTML site from the scanned manifest
    Generate(CacheArgs),
    /// Run the full pipeline: scan → generate
    Build(CacheArgs),
    /// Validate content directory without building
    Check,
    /// Print the parsed front matter and body of a single document
    Inspect {
        /// Document to inspect
        file: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Scan => {
            let manifest = scan::scan(&cli.source)?;
            write_manifest(&manifest, &cli.temp_dir)?;
            output::print_scan_output(&manifest, &cli.source);
        }
        Command::Generate(cache_args) => {
            let manifest_path = cli.temp_dir.join(MANIFEST_FILENAME);
            let manifest_content = std::fs::read_to_string(&manifest_path)?;
            let input_manifest: serde_json::Value = serde_json::from_str(&manifest_content)?;
            let site_config: config::SiteConfig =
                serde_json::from_value(input_manifest.get("config").cloned().unwrap_or_default())?;
            init_thread_pool(&site_config.processing);

            let report = generate::generate(
                &manifest_path,
                &cli.source,
                &cli.output,
                !cache_args.no_cache,
            )?;
            output::print_generate_output(&report);
        }
        Command::Build(cache_args) => {
            println!("==> Stage 1: Scanning {}", cli.source.display());
            let site_config = config::load_config(&cli.source)?;
            init_thread_pool(&site_config.processing);
            let manifest = scan::scan_with_config(&cli.source, site_config)?;
            let manifest_path = write_manifest(&manifest, &cli.temp_dir)?;
            output::print_scan_output(&manifest, &cli.source);

            println!("==> Stage 2: Generating HTML → {}", cli.output.display());
            let report = generate::generate(
                &manifest_path,
                &cli.source,
                &cli.output,
                !cache_args.no_cache,
            )?;
            output::print_generate_output(&report);

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let manifest = scan::scan(&cli.source)?;
            let issues = output::print_check_output(&manifest);
            if issues == 0 {
                println!("==> Content is valid");
            } else {
                println!("==> Content is valid; degraded pages use default metadata");
            }
        }
        Command::Inspect { file } => {
            let raw = read_document(&file)?;
            let (front_matter, body, block) = frontmatter::split_with_state(&raw);
            output::print_inspect_output(&front_matter, block, body)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

const MANIFEST_FILENAME: &str = "manifest.json";

fn write_manifest(manifest: &scan::Manifest, temp_dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(temp_dir)?;
    let manifest_path = temp_dir.join(MANIFEST_FILENAME);
    let json = serde_json::to_string_pretty(manifest)?;
    std::fs::write(&manifest_path, json)?;
    tracing::debug!(path = %manifest_path.display(), "wrote manifest");
    Ok(manifest_path)
}

/// Read a document as text, replacing invalid UTF-8 like the scan stage does.
fn read_document(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(path = %path.display(), "document is not valid UTF-8; invalid bytes replaced");
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    })
}

/// Install the tracing subscriber. `RUST_LOG` wins over the CLI flags.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_logging(verbose: bool, quiet: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if quiet {
        EnvFilter::new("warn")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
