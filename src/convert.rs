//! Conversion orchestration: content in, PDF bytes out.
//!
//! ## Pipeline
//!
//! ```text
//! content ──▶ validate options ──▶ resolve type ──▶ convert to HTML ──▶ render
//!             (every bad field)    (declared wins,   (format module)    (engine)
//!                                   else detector)
//! ```
//!
//! ## Why free functions
//!
//! There is no state to carry between conversions — options travel in a
//! struct and the render engine is passed by reference — so the operations
//! are plain async functions rather than methods on a service object. The
//! engine parameter is generic over [`RenderEngine`] so callers (and tests)
//! choose the implementation.
//!
//! Failure semantics: a conversion either returns complete PDF bytes or an
//! error, never partial output. Validation and unsupported-type errors
//! surface as themselves; everything downstream is wrapped into
//! [`DocPressError::Conversion`] with the originating message. Batch runs
//! isolate failures per item and never abort the whole run.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::detect::{ContentType, DeclaredType};
use crate::error::DocPressError;
use crate::formats::{converter_for, HtmlDocument};
use crate::options::ConversionOptions;
use crate::render::RenderEngine;

/// Convert content to a complete HTML document without rendering.
///
/// This is the synchronous core of every conversion; it also powers the
/// CLI's `--html-only` mode. Identical content and options produce
/// byte-identical output.
pub fn convert_to_html(
    content: &str,
    declared: DeclaredType,
    options: &ConversionOptions,
) -> Result<HtmlDocument, DocPressError> {
    options
        .page_layout
        .validate()
        .map_err(DocPressError::Validation)?;

    let content_type = declared.resolve(content);
    debug!(%content_type, len = content.len(), "Resolved content type");

    converter_for(content_type).convert(content, options)
}

/// Convert content to PDF bytes.
///
/// Validates options, resolves the content type (a declared type wins over
/// detection), normalises to HTML, and renders through `engine`.
pub async fn convert<E: RenderEngine>(
    content: &str,
    declared: DeclaredType,
    options: &ConversionOptions,
    engine: &E,
) -> Result<Vec<u8>, DocPressError> {
    let html = convert_to_html(content, declared, options)
        .map_err(DocPressError::into_conversion_failure)?;

    let pdf = engine
        .render(&html, &options.page_layout)
        .await
        .map_err(DocPressError::into_conversion_failure)?;

    info!(bytes = pdf.len(), "Conversion complete");
    Ok(pdf)
}

/// Convert a file on disk to a PDF file.
///
/// With `DeclaredType::Auto` the type comes from the input's file extension
/// (unrecognised extensions are treated as plain text). The output is
/// written atomically: bytes land in a temporary file next to the target
/// and are renamed into place, so a crash never leaves a truncated PDF.
pub async fn convert_file<E: RenderEngine>(
    input: &Path,
    output: &Path,
    declared: DeclaredType,
    options: &ConversionOptions,
    engine: &E,
) -> Result<PathBuf, DocPressError> {
    let content = std::fs::read_to_string(input).map_err(|e| DocPressError::Io {
        action: "read",
        path: input.to_path_buf(),
        source: e,
    })?;

    let declared = match declared {
        DeclaredType::Auto => DeclaredType::Known(ContentType::from_extension(input)),
        known => known,
    };

    let pdf = convert(&content, declared, options, engine).await?;
    write_atomic(output, &pdf)?;

    info!(
        input = %input.display(),
        output = %output.display(),
        "Wrote PDF"
    );
    Ok(output.to_path_buf())
}

fn write_atomic(output: &Path, bytes: &[u8]) -> Result<(), DocPressError> {
    let dir = output.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir),
        None => tempfile::NamedTempFile::new(),
    }
    .map_err(|e| DocPressError::Io {
        action: "create temporary file for",
        path: output.to_path_buf(),
        source: e,
    })?;

    std::io::Write::write_all(&mut tmp, bytes).map_err(|e| DocPressError::Io {
        action: "write",
        path: output.to_path_buf(),
        source: e,
    })?;

    tmp.persist(output).map_err(|e| DocPressError::Io {
        action: "write",
        path: output.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// One input in a batch run.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub input: PathBuf,
    pub output: PathBuf,
    pub declared: DeclaredType,
}

impl BatchItem {
    /// Item with auto-detected type and an output path derived by swapping
    /// the input's extension for `.pdf`.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let output = input.with_extension("pdf");
        Self {
            input,
            output,
            declared: DeclaredType::Auto,
        }
    }
}

/// Result of one batch item; either an output path or an error message.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub input: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Convert a batch of files, strictly sequentially.
///
/// One outcome per item, in input order. A failing item is recorded and
/// the run continues; there are no retries and the batch as a whole never
/// fails.
pub async fn batch_convert<E: RenderEngine>(
    items: &[BatchItem],
    options: &ConversionOptions,
    engine: &E,
) -> Vec<BatchOutcome> {
    let mut outcomes = Vec::with_capacity(items.len());

    for item in items {
        match convert_file(&item.input, &item.output, item.declared, options, engine).await {
            Ok(path) => outcomes.push(BatchOutcome {
                input: item.input.clone(),
                output: Some(path),
                error: None,
            }),
            Err(e) => {
                warn!(input = %item.input.display(), "Batch item failed: {e}");
                outcomes.push(BatchOutcome {
                    input: item.input.clone(),
                    output: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let failed = outcomes.iter().filter(|o| !o.succeeded()).count();
    info!(
        total = outcomes.len(),
        failed, "Batch conversion finished"
    );
    outcomes
}
