//! HTML passthrough conversion.
//!
//! Two paths: a complete document (doctype or `<html` present) gets the print
//! stylesheet injected into its `<head>` and is otherwise returned untouched;
//! a fragment is wrapped in the shell template.
//!
//! Caller-supplied markup is trusted and handed to the renderer as-is — no
//! sanitisation, no validation. The renderer runs it in an isolated
//! throwaway page, and "fixing" user HTML silently would be worse than the
//! documented risk.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DocPressError;
use crate::formats::{Converter, HtmlDocument};
use crate::options::ConversionOptions;
use crate::template;

static RE_COMPLETE_DOC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<!doctype\s+html|<html[\s>]").unwrap());
static RE_HEAD_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<head[^>]*>").unwrap());
static RE_HTML_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<html[^>]*>").unwrap());

/// Converts raw HTML: completes fragments, styles complete documents.
pub struct HtmlConverter;

impl Converter for HtmlConverter {
    fn convert(
        &self,
        content: &str,
        options: &ConversionOptions,
    ) -> Result<HtmlDocument, DocPressError> {
        if RE_COMPLETE_DOC.is_match(content) {
            return Ok(inject_print_style(content));
        }

        let title = options.title.as_deref().unwrap_or("");
        Ok(template::bind(
            content,
            title,
            options.template_path.as_deref(),
        ))
    }
}

/// Insert the print stylesheet into a complete document's `<head>`,
/// creating a head (or head + html wrapper) when the document lacks one.
fn inject_print_style(content: &str) -> String {
    let style_block = format!("<style>\n{}</style>", template::DEFAULT_STYLE);

    if let Some(m) = RE_HEAD_OPEN.find(content) {
        let mut doc = String::with_capacity(content.len() + style_block.len() + 1);
        doc.push_str(&content[..m.end()]);
        doc.push('\n');
        doc.push_str(&style_block);
        doc.push_str(&content[m.end()..]);
        return doc;
    }

    if let Some(m) = RE_HTML_OPEN.find(content) {
        let mut doc = String::with_capacity(content.len() + style_block.len() + 16);
        doc.push_str(&content[..m.end()]);
        doc.push_str("\n<head>");
        doc.push_str(&style_block);
        doc.push_str("</head>");
        doc.push_str(&content[m.end()..]);
        return doc;
    }

    // Doctype only, no <html> tag: wrap what follows the doctype.
    format!("{content}\n<head>{style_block}</head>")
}
