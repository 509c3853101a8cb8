//! # docpress
//!
//! Convert text, HTML, JSON, and Markdown content into print-quality PDF
//! documents through a headless browser.
//!
//! ## Why this crate?
//!
//! Generating a PDF directly means owning a layout engine — text shaping,
//! pagination, table breaking, font fallback. Browsers already solved all of
//! that for print. So this crate does the part browsers don't: it normalises
//! heterogeneous input into a single styled HTML document, then delegates
//! typesetting to Chromium's `printToPDF`. The conversion core is pure
//! string work and fully testable without a browser in sight.
//!
//! ## Pipeline Overview
//!
//! ```text
//! content
//!  │
//!  ├─ 1. Detect    declared type wins, else JSON → HTML → Markdown → text
//!  ├─ 2. Convert   one converter per format, everything user-supplied escaped
//!  ├─ 3. Bind      shell template: {title} / {content} / {style}
//!  ├─ 4. Render    headless Chromium printToPDF (layout options mapped)
//!  └─ 5. Output    PDF bytes, or an atomically written file
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docpress::{convert, ChromiumEngine, ConversionOptions, DeclaredType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = ChromiumEngine::new();
//!     let options = ConversionOptions::builder()
//!         .title("Release notes")
//!         .build()?;
//!     let pdf = convert("# v2.0\n\nShipped.", DeclaredType::Auto, &options, &engine).await?;
//!     std::fs::write("notes.pdf", pdf)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `docpress` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `server` | off     | axum HTTP API: `POST /convert`, `GET /healthz` |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docpress = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod convert;
pub mod detect;
pub mod error;
pub mod formats;
pub mod options;
pub mod render;
#[cfg(feature = "server")]
pub mod server;
pub mod template;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use convert::{batch_convert, convert, convert_file, convert_to_html, BatchItem, BatchOutcome};
pub use detect::{detect, ContentType, DeclaredType};
pub use error::{DocPressError, FieldError};
pub use formats::{Converter, HtmlDocument};
pub use options::{
    ConversionOptions, ConversionOptionsBuilder, JsonDisplayMode, Margins, PageFormat,
    PageLayoutOptions,
};
pub use render::{ChromiumEngine, RenderEngine};
