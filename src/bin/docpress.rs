//! CLI binary for docpress.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionOptions` and drives single, stdin, or batch conversions.

use anyhow::{Context, Result};
use clap::Parser;
use docpress::{
    batch_convert, convert, convert_file, convert_to_html, BatchItem, ChromiumEngine,
    ConversionOptions, DeclaredType, JsonDisplayMode, Margins, RenderEngine,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a file, type inferred from the extension
  docpress notes.md

  # Convert stdin, type detected from content
  cat report.json | docpress - -o report.pdf

  # Force the type and JSON layout
  docpress data.txt --type json --json-mode table -o data.pdf

  # Page setup
  docpress doc.md --page-format letter --margin 2cm --title "Quarterly"

  # Inspect the intermediate HTML without a browser
  docpress doc.md --html-only

  # Batch conversion with a JSON report
  docpress a.md b.html c.json --json > report.json

CONTENT TYPES:
  text, html, json, markdown, or auto (default). With auto, files go by
  extension and stdin goes by content detection.

ENVIRONMENT VARIABLES:
  DOCPRESS_OUTPUT   Default output path
  DOCPRESS_TYPE     Default declared content type
  RUST_LOG          Overrides -v/-q log filtering

A local Chrome or Chromium installation is required for PDF output
(--html-only works without one)."#;

/// Convert text, HTML, JSON, and Markdown to PDF via a headless browser.
#[derive(Parser, Debug)]
#[command(
    name = "docpress",
    version,
    about = "Convert text, HTML, JSON, and Markdown to PDF",
    long_about = "Convert content to print-quality PDF documents. Input is normalised to styled \
HTML and typeset by a headless Chromium browser. Multiple inputs run as a sequential batch.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input files, or `-` for stdin (single input only).
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output path. Defaults to the input name with a `.pdf` extension
    /// (`output.pdf` for stdin). Ignored in batch mode.
    #[arg(short, long, env = "DOCPRESS_OUTPUT")]
    output: Option<PathBuf>,

    /// Declared content type: text, html, json, markdown, auto.
    #[arg(long = "type", env = "DOCPRESS_TYPE", default_value = "auto")]
    content_type: String,

    /// JSON layout: structured, table, raw.
    #[arg(long, default_value = "structured")]
    json_mode: String,

    /// Paper size: A4, A3, A5, Legal, Letter, Tabloid.
    #[arg(long, default_value = "A4")]
    page_format: String,

    /// Uniform page margin as a CSS length (e.g. 1cm, 0.5in, 24px).
    #[arg(long)]
    margin: Option<String>,

    /// Skip CSS backgrounds when printing.
    #[arg(long)]
    no_background: bool,

    /// Honour an @page size in the document CSS over --page-format.
    #[arg(long)]
    prefer_css_page_size: bool,

    /// Path to an HTML snippet repeated at the top of every page.
    #[arg(long)]
    header: Option<PathBuf>,

    /// Path to an HTML snippet repeated at the bottom of every page.
    #[arg(long)]
    footer: Option<PathBuf>,

    /// Document title (overrides titles derived from content).
    #[arg(long)]
    title: Option<String>,

    /// Path to a custom shell template with {title}/{content}/{style}.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Per-render timeout in seconds.
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Print the intermediate HTML instead of rendering a PDF.
    #[arg(long)]
    html_only: bool,

    /// Emit a JSON batch report instead of progress output.
    #[arg(long)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCPRESS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCPRESS_QUIET")]
    quiet: bool,

    /// Run the HTTP API instead of converting.
    #[cfg(feature = "server")]
    #[arg(long)]
    serve: bool,

    /// Port for --serve.
    #[cfg(feature = "server")]
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    #[cfg(feature = "server")]
    if cli.serve {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cli.port));
        return docpress::server::serve(addr).await.context("Server failed");
    }

    let options = build_options(&cli)?;
    let declared =
        DeclaredType::from_name(&cli.content_type).context("Invalid --type value")?;

    // ── HTML-only mode: no browser involved ──────────────────────────────
    if cli.html_only {
        let content = read_single_input(&cli)?;
        let html = convert_to_html(&content, declared, &options).context("Conversion failed")?;
        match &cli.output {
            Some(path) => std::fs::write(path, html)
                .with_context(|| format!("Failed to write {}", path.display()))?,
            None => io::stdout()
                .write_all(html.as_bytes())
                .context("Failed to write to stdout")?,
        }
        return Ok(());
    }

    let engine = ChromiumEngine::new();
    let result = run(&cli, declared, &options, &engine).await;
    engine.shutdown().await;
    result
}

async fn run(
    cli: &Cli,
    declared: DeclaredType,
    options: &ConversionOptions,
    engine: &ChromiumEngine,
) -> Result<()> {
    if cli.inputs.len() > 1 {
        return run_batch(cli, declared, options, engine).await;
    }

    let input = &cli.inputs[0];
    if input == "-" {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read stdin")?;
        let output = cli
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from("output.pdf"));
        let pdf = convert(&content, declared, options, engine)
            .await
            .context("Conversion failed")?;
        std::fs::write(&output, pdf)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        if !cli.quiet {
            eprintln!("{} {}", green("✔"), bold(&output.display().to_string()));
        }
        return Ok(());
    }

    let input = PathBuf::from(input);
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| input.with_extension("pdf"));
    convert_file(&input, &output, declared, options, engine)
        .await
        .context("Conversion failed")?;
    if !cli.quiet {
        eprintln!("{} {}", green("✔"), bold(&output.display().to_string()));
    }
    Ok(())
}

async fn run_batch(
    cli: &Cli,
    declared: DeclaredType,
    options: &ConversionOptions,
    engine: &ChromiumEngine,
) -> Result<()> {
    let items: Vec<BatchItem> = cli
        .inputs
        .iter()
        .map(|input| {
            let mut item = BatchItem::new(input);
            item.declared = declared;
            item
        })
        .collect();

    let show_progress = !cli.quiet && !cli.json;
    let bar = if show_progress {
        let bar = ProgressBar::new(items.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} files",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("Converting");
        Some(bar)
    } else {
        None
    };

    // Items run strictly sequentially; report per item as each finishes.
    let mut outcomes = Vec::with_capacity(items.len());
    for item in &items {
        let outcome = batch_convert(std::slice::from_ref(item), options, engine)
            .await
            .remove(0);
        if let Some(bar) = &bar {
            match (&outcome.output, &outcome.error) {
                (Some(path), _) => {
                    bar.println(format!("  {} {}", green("✓"), path.display()))
                }
                (None, Some(error)) => bar.println(format!(
                    "  {} {}  {}",
                    red("✗"),
                    item.input.display(),
                    dim(error)
                )),
                _ => {}
            }
            bar.inc(1);
        }
        outcomes.push(outcome);
    }
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    let failed = outcomes.iter().filter(|o| !o.succeeded()).count();

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcomes).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        let total = outcomes.len();
        if failed == 0 {
            eprintln!("{} {} files converted", green("✔"), bold(&total.to_string()));
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} failed)",
                red("✘"),
                total - failed,
                total,
                red(&failed.to_string()),
            );
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} conversions failed", outcomes.len());
    }
    Ok(())
}

/// Map CLI args to `ConversionOptions`.
fn build_options(cli: &Cli) -> Result<ConversionOptions> {
    let mut builder = ConversionOptions::builder()
        .json_display_mode(JsonDisplayMode::from_name(&cli.json_mode))
        .page_format_name(&cli.page_format)
        .print_background(!cli.no_background)
        .prefer_css_page_size(cli.prefer_css_page_size)
        .render_timeout_secs(cli.timeout);

    if let Some(margin) = &cli.margin {
        builder = builder.margins(Margins::uniform(margin));
    }
    if let Some(title) = &cli.title {
        builder = builder.title(title);
    }
    if let Some(template) = &cli.template {
        builder = builder.template_path(template);
    }
    if let Some(path) = &cli.header {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read header template {}", path.display()))?;
        builder = builder.header_template(html);
    }
    if let Some(path) = &cli.footer {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read footer template {}", path.display()))?;
        builder = builder.footer_template(html);
    }

    builder.build().context("Invalid options")
}

fn read_single_input(cli: &Cli) -> Result<String> {
    anyhow::ensure!(
        cli.inputs.len() == 1,
        "--html-only takes exactly one input"
    );
    let input = &cli.inputs[0];
    if input == "-" {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read stdin")?;
        Ok(content)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))
    }
}
