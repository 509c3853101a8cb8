//! Format-to-HTML converters.
//!
//! Each submodule normalises one input format into HTML. Dispatch is closed:
//! a [`ContentType`] maps to exactly one [`Converter`] via [`converter_for`].
//! Adding a format means adding an enum case and an implementation — there is
//! deliberately no name-keyed registry to grow stale strings in.
//!
//! ## Data Flow
//!
//! ```text
//! raw content ──▶ converter ──▶ HTML fragment ──▶ shell template ──▶ HtmlDocument
//!                 (escape,       (or a complete    (title/style
//!                  structure)     document,         substitution)
//!                                 passed through)
//! ```
//!
//! Converters never mutate their input and never produce partial output.
//! The single correctness-critical invariant they all share: every piece of
//! user-supplied text placed into an HTML text node or attribute is escaped
//! (`&<>"'`) first.

pub mod html;
pub mod json;
pub mod markdown;
pub mod text;

use crate::detect::ContentType;
use crate::error::DocPressError;
use crate::options::ConversionOptions;

pub use html::HtmlConverter;
pub use json::JsonConverter;
pub use markdown::MarkdownConverter;
pub use text::TextConverter;

/// A complete, renderable HTML document.
pub type HtmlDocument = String;

/// One format's normalisation into HTML.
pub trait Converter: Send + Sync {
    /// Convert raw content into a complete HTML document.
    ///
    /// Implementations are pure with respect to their input: identical
    /// content and options always produce byte-identical output.
    fn convert(
        &self,
        content: &str,
        options: &ConversionOptions,
    ) -> Result<HtmlDocument, DocPressError>;
}

/// Look up the converter for a resolved content type.
pub fn converter_for(content_type: ContentType) -> &'static dyn Converter {
    match content_type {
        ContentType::Text => &TextConverter,
        ContentType::Html => &HtmlConverter,
        ContentType::Json => &JsonConverter,
        ContentType::Markdown => &MarkdownConverter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_content_type_has_a_converter() {
        let options = ConversionOptions::default();
        for ct in [
            ContentType::Text,
            ContentType::Html,
            ContentType::Json,
            ContentType::Markdown,
        ] {
            let input = match ct {
                ContentType::Json => r#"{"ok":true}"#,
                _ => "hello",
            };
            let doc = converter_for(ct).convert(input, &options).unwrap();
            assert!(doc.contains("<html"), "{ct} output is not a document");
        }
    }

    #[test]
    fn conversion_is_idempotent() {
        let options = ConversionOptions::default();
        for (ct, input) in [
            (ContentType::Text, "line one\n\nline two"),
            (ContentType::Markdown, "# Head\n\n*body* text"),
            (ContentType::Json, r#"{"a":[1,2],"b":"x"}"#),
            (ContentType::Html, "<p>frag</p>"),
        ] {
            let first = converter_for(ct).convert(input, &options).unwrap();
            let second = converter_for(ct).convert(input, &options).unwrap();
            assert_eq!(first, second, "{ct} output is not stable");
        }
    }
}
